use healthtrust_social::session::{
    FileSessionStore, SessionManager, SessionStore, TOKEN_KEY, USER_KEY,
};
use std::sync::Arc;

#[test]
fn session_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("session.json");

    let first = SessionManager::new(Arc::new(FileSessionStore::new(&path)));
    first.login("grace@example.org")?;

    let second = SessionManager::new(Arc::new(FileSessionStore::new(&path)));
    let restored = second.restore()?.expect("restored session");
    assert_eq!(restored.user.name, "grace");
    assert_eq!(restored.user.email, "grace@example.org");
    assert!(second.is_authenticated());
    Ok(())
}

#[test]
fn corrupt_user_entry_is_wiped_on_restore() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"token": "t", "user": "{broken"}"#)?;

    let store = Arc::new(FileSessionStore::new(&path));
    let manager = SessionManager::new(store.clone());
    assert!(manager.restore()?.is_none());
    assert_eq!(store.get(TOKEN_KEY)?, None);
    assert_eq!(store.get(USER_KEY)?, None);
    Ok(())
}

#[test]
fn logout_removes_persisted_entries() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    let store = Arc::new(FileSessionStore::new(&path));
    let manager = SessionManager::new(store.clone());

    manager.register("Kim", "kim@example.org")?;
    assert!(store.get(TOKEN_KEY)?.is_some());
    manager.logout()?;
    assert!(store.get(TOKEN_KEY)?.is_none());
    assert!(SessionManager::new(store).restore()?.is_none());
    Ok(())
}

#[test]
fn missing_file_means_no_session() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let manager =
        SessionManager::new(Arc::new(FileSessionStore::new(dir.path().join("absent.json"))));
    assert!(manager.restore()?.is_none());
    Ok(())
}

#[test]
fn truncated_file_is_reset_on_restore() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{truncated")?;

    let store = Arc::new(FileSessionStore::new(&path));
    let manager = SessionManager::new(store.clone());
    assert!(manager.restore()?.is_none());
    assert!(!manager.is_authenticated());
    assert_eq!(std::fs::read_to_string(&path)?.trim(), "{}");
    assert_eq!(store.get(TOKEN_KEY)?, None);

    manager.login("ada@example.org")?;
    let restored = SessionManager::new(store).restore()?.expect("session after reset");
    assert_eq!(restored.user.name, "ada");
    Ok(())
}
