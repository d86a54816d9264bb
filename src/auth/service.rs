use crate::auth::models::{
    LoginRequest, LoginResponse, Principal, Profile, RegisterRequest, RegisterResponse,
    SendVerifyResponse, SessionView,
};
use crate::config::AuthConfig;
use crate::db::{NewUser, User, UserId, UserRepository};
use crate::error::{AuthError, RepoError, StoreError, TokenError};
use crate::notify::Notifier;
use crate::otp::{OtpPurpose, OtpRecord, OtpStore};
use crate::password::{hash_password, validate_password, verify_against_dummy, verify_password};
use crate::session::{Session, SessionStore};
use crate::token::{Identity, TokenCodec, TokenPurpose};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    otps: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
    codec: TokenCodec,
    otp_ttl: Duration,
    default_role_id: i64,
    service_name: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        otps: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        config: &AuthConfig,
        service_name: &str,
    ) -> Self {
        let codec = TokenCodec::new(
            config.jwt_secret.clone(),
            config.issuer.clone(),
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::hours(config.refresh_token_ttl_hours),
        );

        Self {
            users,
            sessions,
            otps,
            notifier,
            codec,
            otp_ttl: Duration::minutes(config.otp_ttl_minutes),
            default_role_id: config.default_role_id,
            service_name: service_name.to_string(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AuthError::ValidationError("name is required".to_string()));
        }

        let email = normalize(req.email);
        let phone_number = normalize(req.phone_number);
        if email.is_none() && phone_number.is_none() {
            return Err(AuthError::ValidationError(
                "phone number or email is required".to_string(),
            ));
        }

        let purpose: OtpPurpose = req.confirm_type.trim().parse()?;
        let address = match purpose {
            OtpPurpose::Phone => phone_number.clone(),
            OtpPurpose::Email => email.clone(),
        }
        .ok_or_else(|| {
            AuthError::ValidationError(format!("{} is required to confirm by {}", address_label(purpose), purpose))
        })?;

        validate_password(&req.password)?;
        let password_hash = hash_password(&req.password)?;

        info!("Registering user {} confirming by {}", name, purpose);
        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                phone_number,
                email,
                password_hash,
                role_id: self.default_role_id,
            })
            .await
            .map_err(|e| match e {
                RepoError::UniqueViolation(constraint) => {
                    warn!("Registration rejected, address taken ({})", constraint);
                    AuthError::DuplicateAddress(constraint)
                }
                other => repo_failure("register", other),
            })?;

        let role = self
            .users
            .get_role(user.role_id)
            .await
            .map_err(|e| repo_failure("register", e))?;

        let verify = self.send_verify(purpose, &address).await?;

        info!("Registered user {} with id {}", user.name, user.id);
        Ok(RegisterResponse {
            id: user.id,
            name: user.name,
            role_name: role.name,
            otp_expires_at: verify.otp_expires_at,
        })
    }

    pub async fn login(&self, req: LoginRequest, client_ip: &str, user_agent: &str) -> Result<LoginResponse, AuthError> {
        let (user, verified) = if let Some(email) = normalize(req.email) {
            info!("Received login request for email: {}", email);
            let user = self
                .users
                .find_by_email(&email)
                .await
                .map_err(|e| login_miss(e, &req.password))?;
            let verified = user.email_verified_at.is_some();
            (user, verified)
        } else if let Some(phone_number) = normalize(req.phone_number) {
            info!("Received login request for phone: {}", phone_number);
            let user = self
                .users
                .find_by_phone(&phone_number)
                .await
                .map_err(|e| login_miss(e, &req.password))?;
            let verified = user.phone_verified_at.is_some();
            (user, verified)
        } else {
            return Err(AuthError::ValidationError(
                "phone number or email is required".to_string(),
            ));
        };

        if !verify_password(&req.password, &user.password_hash) {
            warn!("Login failed for user {}: wrong password", user.id);
            return Err(AuthError::AuthenticationFailed);
        }
        if !verified {
            warn!("Login refused for user {}: not verified", user.id);
            return Err(AuthError::NotVerified);
        }

        let role = self
            .users
            .get_role(user.role_id)
            .await
            .map_err(|e| repo_failure("login", e))?;

        let jti = Uuid::new_v4().to_string();
        let identity = Identity {
            user_id: user.id,
            user_name: user.name.clone(),
            role_id: user.role_id,
            jti: jti.clone(),
        };
        let pair = self.codec.issue_pair(&identity).map_err(token_failure)?;

        let session = Session::new(user.id, user.role_id, user_agent.to_string(), client_ip.to_string());
        self.sessions
            .create(&jti, session, self.codec.refresh_ttl())
            .await
            .map_err(|e| store_failure("login", e))?;

        info!("User {} logged in, session {}", user.id, jti);
        Ok(LoginResponse {
            id: user.id,
            name: user.name,
            role_id: user.role_id,
            role_name: role.name,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            jti: pair.jti,
        })
    }

    /// Exchanges a refresh token for a new pair. The presented token's session
    /// is consumed, so each refresh token works at most once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse, AuthError> {
        let claims = self
            .codec
            .verify(refresh_token, TokenPurpose::Refresh)
            .map_err(rejected_token)?;

        let old = self.owned_session(&claims.jti, claims.sub).await?;
        let role = self
            .users
            .get_role(old.role_id)
            .await
            .map_err(|e| repo_failure("refresh", e))?;

        let jti = Uuid::new_v4().to_string();
        let identity = Identity {
            user_id: claims.sub,
            user_name: claims.user_name.clone(),
            role_id: old.role_id,
            jti: jti.clone(),
        };
        let pair = self.codec.issue_pair(&identity).map_err(token_failure)?;

        let session = Session::new(old.user_id, old.role_id, old.user_agent.clone(), old.ip.clone());
        self.sessions
            .create(&jti, session, self.codec.refresh_ttl())
            .await
            .map_err(|e| store_failure("refresh", e))?;

        if let Err(e) = self.sessions.delete(&claims.jti).await {
            self.discard_session(&jti).await;
            return Err(match e {
                StoreError::NotFound => {
                    warn!("Refresh lost race for session {}", claims.jti);
                    AuthError::SessionNotFound
                }
                other => store_failure("refresh", other),
            });
        }

        info!("Rotated session {} to {} for user {}", claims.jti, jti, claims.sub);
        Ok(LoginResponse {
            id: claims.sub,
            name: claims.user_name,
            role_id: old.role_id,
            role_name: role.name,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            jti: pair.jti,
        })
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .codec
            .verify(refresh_token, TokenPurpose::Refresh)
            .map_err(rejected_token)?;

        self.owned_session(&claims.jti, claims.sub).await?;
        self.sessions.delete(&claims.jti).await.map_err(|e| match e {
            StoreError::NotFound => AuthError::SessionNotFound,
            other => store_failure("logout", other),
        })?;

        info!("User {} logged out of session {}", claims.sub, claims.jti);
        Ok(())
    }

    pub async fn sessions(&self, user_id: UserId) -> Result<Vec<SessionView>, AuthError> {
        let user = self.users.find_by_id(user_id).await.map_err(|e| match e {
            RepoError::NotFound => AuthError::UserNotFound,
            other => repo_failure("sessions", other),
        })?;
        let sessions = self
            .sessions
            .get_all_by_user(user_id)
            .await
            .map_err(|e| store_failure("sessions", e))?;

        debug!("User {} has {} active sessions", user_id, sessions.len());
        Ok(sessions
            .into_iter()
            .map(|session| SessionView {
                jti: session.jti,
                user_id: user.id,
                user_name: user.name.clone(),
                user_email: user.email.clone(),
                user_phone_number: user.phone_number.clone(),
                role_id: session.role_id,
                user_agent: session.user_agent,
                ip: session.ip,
                created_at: session.created_at,
            })
            .collect())
    }

    pub async fn revoke_session(&self, caller: UserId, jti: &str) -> Result<(), AuthError> {
        let session = self.sessions.get_by_jti(jti).await.map_err(|e| match e {
            StoreError::NotFound => AuthError::SessionNotFound,
            other => store_failure("revoke_session", other),
        })?;

        if session.user_id != caller {
            warn!("User {} attempted to revoke session {} of user {}", caller, jti, session.user_id);
            return Err(AuthError::Forbidden);
        }

        self.sessions.delete(jti).await.map_err(|e| match e {
            StoreError::NotFound => AuthError::SessionNotFound,
            other => store_failure("revoke_session", other),
        })?;

        info!("User {} revoked session {}", caller, jti);
        Ok(())
    }

    pub async fn send_verify(&self, purpose: OtpPurpose, address: &str) -> Result<SendVerifyResponse, AuthError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AuthError::ValidationError(format!("{} is required", address_label(purpose))));
        }

        let user = self.find_by_address(purpose, address).await?;

        // an expired leftover counts as absent, so the conditional save replaces it
        let record = OtpRecord::generate(purpose, address, user.id, self.otp_ttl);
        let otp_expires_at = record.expires_at;
        let code = record.code.clone();

        self.otps
            .save(record, self.otp_ttl)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => {
                    info!("Verification code for {} {} still outstanding", purpose, address);
                    AuthError::AlreadyOutstanding
                }
                other => store_failure("send_verify", other),
            })?;

        self.dispatch(purpose, address.to_string(), code);

        info!("Sent {} verification code to {}", purpose, address);
        Ok(SendVerifyResponse { otp_expires_at })
    }

    pub async fn confirm_verify(&self, purpose: OtpPurpose, address: &str, code: &str) -> Result<(), AuthError> {
        let address = address.trim();
        let code = code.trim();
        if address.is_empty() || code.is_empty() {
            return Err(AuthError::ValidationError(format!(
                "{} and code are required",
                address_label(purpose)
            )));
        }

        let record = self.otps.get(purpose, address).await.map_err(|e| match e {
            StoreError::NotFound => {
                warn!("No outstanding {} code for {}", purpose, address);
                AuthError::AuthenticationFailed
            }
            other => store_failure("confirm_verify", other),
        })?;

        if !record.matches(code) {
            warn!("Wrong {} verification code for {}", purpose, address);
            return Err(AuthError::AuthenticationFailed);
        }

        let user = self.find_by_address(purpose, address).await?;
        let marked = match purpose {
            OtpPurpose::Phone => self.users.mark_phone_verified(user.id).await,
            OtpPurpose::Email => self.users.mark_email_verified(user.id).await,
        };
        marked.map_err(|e| match e {
            RepoError::NotFound => AuthError::UserNotFound,
            other => repo_failure("confirm_verify", other),
        })?;

        if let Err(e) = self.otps.delete(purpose, address).await {
            error!("Failed to remove used {} code for {}: {}", purpose, address, e);
        }

        info!("User {} verified {} {}", user.id, purpose, address);
        Ok(())
    }

    pub async fn update_password(&self, user_id: UserId, old_password: &str, new_password: &str) -> Result<(), AuthError> {
        let user = self.users.find_by_id(user_id).await.map_err(|e| match e {
            RepoError::NotFound => AuthError::UserNotFound,
            other => repo_failure("update_password", other),
        })?;

        if !verify_password(old_password, &user.password_hash) {
            warn!("Password change for user {} rejected: old password mismatch", user_id);
            return Err(AuthError::OldPasswordMismatch);
        }

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        self.users
            .update_password_hash(user_id, &password_hash)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => AuthError::UserNotFound,
                other => repo_failure("update_password", other),
            })?;

        info!("Password updated for user {}", user_id);
        Ok(())
    }

    /// Bearer check for protected calls. Access tokens are not looked up in
    /// the session whitelist; they live until they expire.
    pub fn authenticate(&self, access_token: &str) -> Result<Principal, AuthError> {
        let claims = self
            .codec
            .verify(access_token, TokenPurpose::Access)
            .map_err(rejected_token)?;

        Ok(Principal {
            user_id: claims.sub,
            user_name: claims.user_name,
            role_id: claims.role_id,
            jti: claims.jti,
        })
    }

    pub async fn profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        let principal = self.authenticate(access_token)?;
        let user = self.users.find_by_id(principal.user_id).await.map_err(|e| match e {
            RepoError::NotFound => AuthError::UserNotFound,
            other => repo_failure("profile", other),
        })?;
        let role = self
            .users
            .get_role(user.role_id)
            .await
            .map_err(|e| repo_failure("profile", e))?;

        Ok(Profile {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            role_name: role.name,
        })
    }

    async fn find_by_address(&self, purpose: OtpPurpose, address: &str) -> Result<User, AuthError> {
        let found = match purpose {
            OtpPurpose::Phone => self.users.find_by_phone(address).await,
            OtpPurpose::Email => self.users.find_by_email(address).await,
        };
        found.map_err(|e| unknown_identity("verify", e))
    }

    async fn owned_session(&self, jti: &str, user_id: UserId) -> Result<Session, AuthError> {
        let session = self.sessions.get_by_jti(jti).await.map_err(|e| match e {
            StoreError::NotFound => {
                warn!("Session {} not found", jti);
                AuthError::SessionNotFound
            }
            other => store_failure("session lookup", other),
        })?;

        if session.user_id != user_id {
            warn!("Session {} is not owned by user {}", jti, user_id);
            return Err(AuthError::SessionNotFound);
        }
        Ok(session)
    }

    async fn discard_session(&self, jti: &str) {
        match self.sessions.delete(jti).await {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(e) => error!("Failed to discard session {}: {}", jti, e),
        }
    }

    fn dispatch(&self, purpose: OtpPurpose, address: String, code: String) {
        let notifier = Arc::clone(&self.notifier);
        let subject = format!("Verify code for {}", self.service_name);

        tokio::spawn(async move {
            let body = format!("Your verify code is: {}", code);
            let sent = match purpose {
                OtpPurpose::Phone => notifier.send_sms(&address, &body).await,
                OtpPurpose::Email => notifier.send_mail(&address, &subject, &body).await,
            };
            match sent {
                Ok(()) => debug!("Delivered {} code to {}", purpose, address),
                Err(e) => error!("Failed to deliver {} code to {}: {}", purpose, address, e),
            }
        });
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn address_label(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::Phone => "phone number",
        OtpPurpose::Email => "email",
    }
}

fn unknown_identity(op: &str, err: RepoError) -> AuthError {
    match err {
        RepoError::NotFound => {
            warn!("{} failed: unknown identifier", op);
            AuthError::AuthenticationFailed
        }
        other => repo_failure(op, other),
    }
}

/// Unknown identifiers still pay for a password check.
fn login_miss(err: RepoError, password: &str) -> AuthError {
    if err == RepoError::NotFound {
        verify_against_dummy(password);
    }
    unknown_identity("login", err)
}

fn repo_failure(op: &str, err: RepoError) -> AuthError {
    error!("{} failed in user repository: {}", op, err);
    AuthError::InternalError(err.to_string())
}

fn store_failure(op: &str, err: StoreError) -> AuthError {
    error!("{} failed in store: {}", op, err);
    AuthError::InternalError(err.to_string())
}

fn rejected_token(err: TokenError) -> AuthError {
    warn!("Token rejected: {}", err);
    AuthError::AuthenticationFailed
}

fn token_failure(err: TokenError) -> AuthError {
    error!("Token issuance failed: {}", err);
    AuthError::InternalError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::db::{InMemoryUserRepository, MockUserRepository, Role};
    use crate::error::{ErrorKind, NotifyError};
    use crate::notify::{LogNotifier, MockNotifier};
    use crate::otp::{InMemoryOtpStore, MockOtpStore};
    use crate::session::{InMemorySessionStore, MockSessionStore};
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn auth_config() -> AuthConfig {
        Settings::new_for_test().unwrap().auth
    }

    fn service(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        otps: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
    ) -> AuthService {
        AuthService::new(users, sessions, otps, notifier, &auth_config(), "authcore-test")
    }

    fn user(id: UserId) -> User {
        let now = Utc::now();
        User {
            id,
            phone_number: Some("77011234567".to_string()),
            email: None,
            name: "Aigerim".to_string(),
            password_hash: hash_password("password123").unwrap(),
            role_id: 3,
            phone_verified_at: Some(now),
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user_role() -> Role {
        Role {
            id: 3,
            name: "user".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_send_verify() {
        let users = InMemoryUserRepository::new();
        let created = users
            .create(NewUser {
                name: "Aigerim".to_string(),
                phone_number: Some("77011234567".to_string()),
                email: None,
                password_hash: "x".to_string(),
                role_id: 3,
            })
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_sms()
            .times(1)
            .returning(move |phone, body| {
                tx.send((phone.to_string(), body.to_string())).unwrap();
                Err(NotifyError::Gateway("gateway down".to_string()))
            });

        let otps = Arc::new(InMemoryOtpStore::new());
        let svc = service(Arc::new(users), Arc::new(InMemorySessionStore::new()), otps.clone(), Arc::new(notifier));

        svc.send_verify(OtpPurpose::Phone, "77011234567").await.unwrap();

        let (phone, body) = rx.recv().await.unwrap();
        assert_eq!(phone, "77011234567");
        let stored = otps.get(OtpPurpose::Phone, "77011234567").await.unwrap();
        assert_eq!(body, format!("Your verify code is: {}", stored.code));
        assert_eq!(stored.user_id, created.id);
    }

    #[tokio::test]
    async fn test_repository_outage_is_internal_not_auth_failure() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Err(RepoError::Internal("connection refused".to_string())));

        let svc = service(
            Arc::new(users),
            Arc::new(MockSessionStore::new()),
            Arc::new(MockOtpStore::new()),
            Arc::new(LogNotifier),
        );

        let err = svc
            .login(
                LoginRequest {
                    email: Some("a@example.com".to_string()),
                    phone_number: None,
                    password: "password123".to_string(),
                },
                "127.0.0.1",
                "test",
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_otp_store_outage_is_internal() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_phone().returning(|_| Ok(user(7)));

        let mut otps = MockOtpStore::new();
        otps.expect_save()
            .returning(|_, _| Err(StoreError::Internal("timeout".to_string())));

        let svc = service(
            Arc::new(users),
            Arc::new(MockSessionStore::new()),
            Arc::new(otps),
            Arc::new(MockNotifier::new()),
        );

        let err = svc.send_verify(OtpPurpose::Phone, "77011234567").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_refresh_losing_race_discards_new_session() {
        let mut users = MockUserRepository::new();
        users.expect_get_role().returning(|_| Ok(user_role()));

        let mut sessions = MockSessionStore::new();
        sessions.expect_get_by_jti().returning(|jti| {
            let mut session = Session::new(7, 3, "test".to_string(), "127.0.0.1".to_string());
            session.jti = jti.to_string();
            Ok(session)
        });
        sessions.expect_create().times(1).returning(|_, _, _| Ok(()));
        sessions
            .expect_delete()
            .withf(|jti: &str| jti == "old-jti")
            .times(1)
            .returning(|_| Err(StoreError::NotFound));
        sessions
            .expect_delete()
            .withf(|jti: &str| jti != "old-jti")
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(
            Arc::new(users),
            Arc::new(sessions),
            Arc::new(MockOtpStore::new()),
            Arc::new(MockNotifier::new()),
        );
        let pair = svc
            .codec()
            .issue_pair(&Identity {
                user_id: 7,
                user_name: "Aigerim".to_string(),
                role_id: 3,
                jti: "old-jti".to_string(),
            })
            .unwrap();

        let err = svc.refresh(&pair.refresh_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn test_refresh_rejects_session_of_another_user() {
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get_by_jti()
            .returning(|_| Ok(Session::new(8, 3, "test".to_string(), "127.0.0.1".to_string())));
        sessions.expect_create().never();

        let svc = service(
            Arc::new(MockUserRepository::new()),
            Arc::new(sessions),
            Arc::new(MockOtpStore::new()),
            Arc::new(MockNotifier::new()),
        );
        let pair = svc
            .codec()
            .issue_pair(&Identity {
                user_id: 7,
                user_name: "Aigerim".to_string(),
                role_id: 3,
                jti: "shared".to_string(),
            })
            .unwrap();

        let err = svc.refresh(&pair.refresh_token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn test_register_requires_address_for_chosen_purpose() {
        let svc = service(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockSessionStore::new()),
            Arc::new(MockOtpStore::new()),
            Arc::new(MockNotifier::new()),
        );

        let err = svc
            .register(RegisterRequest {
                name: "Aigerim".to_string(),
                email: Some("a@example.com".to_string()),
                phone_number: None,
                password: "password123".to_string(),
                confirm_type: "phone".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = svc
            .register(RegisterRequest {
                name: "Aigerim".to_string(),
                email: Some("a@example.com".to_string()),
                phone_number: None,
                password: "password123".to_string(),
                confirm_type: "pigeon".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPurpose);

        let err = svc
            .register(RegisterRequest {
                name: "Aigerim".to_string(),
                email: None,
                phone_number: Some("  ".to_string()),
                password: "password123".to_string(),
                confirm_type: "phone".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let svc = service(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockSessionStore::new()),
            Arc::new(MockOtpStore::new()),
            Arc::new(MockNotifier::new()),
        );
        let identity = Identity {
            user_id: 7,
            user_name: "Aigerim".to_string(),
            role_id: 3,
            jti: "j".to_string(),
        };
        let pair = svc.codec().issue_pair(&identity).unwrap();

        let principal = svc.authenticate(&pair.access_token).unwrap();
        assert_eq!(principal.user_id, 7);
        assert_eq!(principal.jti, "j");
        assert_eq!(
            svc.authenticate(&pair.refresh_token).unwrap_err().kind(),
            ErrorKind::AuthenticationFailed
        );
    }
}
