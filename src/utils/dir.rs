use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

/// Default location of the activity log. The file intentionally lives directly in the user's home
/// directory so it's easy to find and open by hand.
pub fn default_log_path() -> Result<PathBuf> {
    let home = {
        #[cfg(windows)]
        {
            env::var("USERPROFILE").context("USERPROFILE should be present on Windows")?
        }
        #[cfg(unix)]
        {
            env::var("HOME").context("Couldn't find HOME")?
        }
    };
    let mut path = PathBuf::from(home);
    path.push("daily_activity.txt");
    Ok(path)
}

/// Directory for diagnostic output (tracing logs). Separate from the activity log itself.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("daylog");
            path
        }
        #[cfg(unix)]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("daylog");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
