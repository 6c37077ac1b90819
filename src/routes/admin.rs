use crate::{
    guards::{ADMIN_AUTH, GUEST, PASSWORD_POLICY},
    handlers,
    routing::{Endpoint, PatternError, RouteTable},
};

/// Admin Routes
///
/// Guard order matters: on the login POST, `guest` runs before `password.policy`, so an
/// admin who is already signed in is redirected without the form being validated.
pub fn register(table: &mut RouteTable) -> Result<(), PatternError> {
    table
        // GET /admin/login
        .get(
            "/admin/login",
            Endpoint::new("admin.login", handlers::login_page),
            &[GUEST],
        )?
        // POST /admin/login
        // Weak passwords are bounced back to the form before any credential lookup.
        .post(
            "/admin/login",
            Endpoint::new("admin.login.submit", handlers::login_submit),
            &[GUEST, PASSWORD_POLICY],
        )?
        // POST /admin/logout (GET kept for plain links)
        .post(
            "/admin/logout",
            Endpoint::new("admin.logout", handlers::logout),
            &[ADMIN_AUTH],
        )?
        .get(
            "/admin/logout",
            Endpoint::new("admin.logout", handlers::logout),
            &[ADMIN_AUTH],
        )?
        // GET /admin/dashboard
        .get(
            "/admin/dashboard",
            Endpoint::new("admin.dashboard", handlers::dashboard),
            &[ADMIN_AUTH],
        )?;
    Ok(())
}
