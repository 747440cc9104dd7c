use tokenward::{Navigator, Url};

use crate::output;

/// Tells the user where to go once the session has ended.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, location: &Url) {
        output::notice(&format!("Session ended, continue at {}", location));
    }
}
