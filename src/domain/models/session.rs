/// Identity returned by the backend for the current token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub identifier: String,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    pub display_name: String,
    token: String,
    verified: bool,
}

impl Session {
    /// A session created by a successful login.
    pub fn new(subject: &str, display_name: &str, token: &str) -> Session {
        return Session {
            subject: subject.to_string(),
            display_name: display_name.to_string(),
            token: token.to_string(),
            verified: true,
        };
    }

    /// A session rebuilt from a stored token. Identity is unknown until the
    /// backend confirms the token.
    pub fn restored(token: &str) -> Session {
        return Session {
            subject: "".to_string(),
            display_name: "".to_string(),
            token: token.to_string(),
            verified: false,
        };
    }

    pub fn token(&self) -> &str {
        return &self.token;
    }

    pub fn is_authenticated(&self) -> bool {
        return !self.token.is_empty();
    }

    pub fn is_verified(&self) -> bool {
        return self.verified;
    }

    pub fn apply_profile(&mut self, profile: UserProfile) {
        self.subject = profile.identifier;
        self.display_name = profile.display_name;
        self.verified = true;
    }
}
