// Forced navigation when a session has to be abandoned

/// Sends the user back to the login entry point
pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}

/// Navigator for the command-line front end
///
/// There is no page to replace, so the redirect is reported to the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliNavigator;

impl Navigator for CliNavigator {
    fn redirect(&self, target: &str) {
        tracing::warn!(target_path = target, "Session expired, redirecting to login");
        eprintln!("Session expired. Run `club-recruit login` to sign in again.");
    }
}
