//! External interface constants
//!
//! Paths of the backend API, the same-origin local routing layer, and the
//! navigation targets used by the session core. The backend exposes
//! role-qualified pairs for staff and guest identities because they are
//! distinct identity domains.

/// Remote backend API paths
pub mod backend {
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const REFRESH_TOKEN: &str = "/auth/refresh-token";

    pub const GUEST_LOGIN: &str = "/guest/auth/login";
    pub const GUEST_LOGOUT: &str = "/guest/auth/logout";
    pub const GUEST_REFRESH_TOKEN: &str = "/guest/auth/refresh-token";

    pub const CHANGE_PASSWORD: &str = "/accounts/change-password";
}

/// Same-origin routing layer paths (fronting the backend to manage cookies)
pub mod local {
    pub const LOGIN: &str = "/api/auth/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const GUEST_LOGIN: &str = "/api/guest/auth/login";
    pub const GUEST_REFRESH_TOKEN: &str = "/api/guest/auth/refresh-token";
    pub const CHANGE_PASSWORD: &str = "/api/accounts/change-password";
}

/// Navigation targets
pub mod pages {
    /// Default route of the application
    pub const DEFAULT: &str = "/";
    /// Login entry point
    pub const LOGIN: &str = "/login";
    /// Logout confirmation page (accepts an `accessToken` query parameter
    /// for replay verification)
    pub const LOGOUT: &str = "/logout";
    /// Refresh-token confirmation page (accepts `refreshToken` and
    /// `redirect` query parameters)
    pub const REFRESH_TOKEN: &str = "/refresh-token";

    /// Staff-restricted path group
    pub const MANAGE_PREFIX: &str = "/manage";
    /// Guest-restricted path group
    pub const GUEST_PREFIX: &str = "/guest";

    /// Entry points that never carry an authenticated session
    ///
    /// The refresh scheduler does not tick while one of these is the
    /// current route.
    #[must_use]
    pub fn is_unauthenticated_entry(path: &str) -> bool {
        matches!(path, LOGIN | LOGOUT | REFRESH_TOKEN)
    }
}
