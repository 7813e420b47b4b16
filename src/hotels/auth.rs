/// Credentials the booking widget presents to the search endpoint.
pub struct SiteAuth {
    origin: String,
    site_instance: String,
    xsrf_token: String,
    session: String,
}

impl SiteAuth {
    pub fn new(origin: String, site_instance: String, xsrf_token: String, session: String) -> Self {
        Self {
            origin,
            site_instance,
            xsrf_token,
            session,
        }
    }

    /// The anti-forgery token travels twice: as a header and as a cookie.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "application/json".to_string()),
            (
                "Content-Type".to_string(),
                "application/json;charset=UTF-8".to_string(),
            ),
            ("Origin".to_string(), self.origin.clone()),
            ("x-wix-instance".to_string(), self.site_instance.clone()),
            ("x-xsrf-token".to_string(), self.xsrf_token.clone()),
            ("Cookie".to_string(), self.cookie()),
        ]
    }

    fn cookie(&self) -> String {
        format!("XSRF-TOKEN={}; bSession={}", self.xsrf_token, self.session)
    }
}
