use crate::model::{Mode, ModeToken, UnsupportedMode};

/// Internal mode → wire token. `off` and `eco` have no token.
pub fn to_external(mode: Mode) -> Result<ModeToken, UnsupportedMode> {
    match mode {
        Mode::Manual => Ok(ModeToken::Manual),
        Mode::Auto3Speed => Ok(ModeToken::Auto),
        Mode::AutoPid => Ok(ModeToken::Pid),
        Mode::Off | Mode::Eco => Err(UnsupportedMode(mode)),
    }
}

/// Wire token → internal mode. Exact, case-sensitive match only.
pub fn to_internal(token: &str) -> Option<Mode> {
    match token {
        "manual" => Some(Mode::Manual),
        "auto" => Some(Mode::Auto3Speed),
        "pid" => Some(Mode::AutoPid),
        _ => None,
    }
}
