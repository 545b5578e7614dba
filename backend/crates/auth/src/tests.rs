//! Scenario tests for the auth crate
//!
//! Use cases run against the in-memory repository, the in-memory rate-limit
//! store and a manual clock; router tests go through `tower::ServiceExt`.

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use ed25519_dalek::{Signer, SigningKey};
    use kernel::time::{Clock, ManualClock};
    use platform::client::ClientIp;
    use platform::rate_limit::MemoryRateLimitStore;

    use crate::application::{
        AuthConfig, GenerateChallengeOutput, GenerateChallengeUseCase, SessionIssuer,
        VerifySignatureInput, VerifySignatureOutput, VerifySignatureUseCase,
    };
    use crate::error::AuthResult;
    use crate::infra::memory::MemoryAuthRepository;

    pub const START: i64 = 1_773_489_600; // 2026-03-14T12:00:00Z

    pub struct Wallet {
        pub key: SigningKey,
        pub address: String,
    }

    impl Wallet {
        pub fn random() -> Self {
            let key = SigningKey::generate(&mut rand::rngs::OsRng);
            let address = bs58::encode(key.verifying_key().to_bytes()).into_string();
            Self { key, address }
        }

        pub fn sign(&self, message: &str) -> String {
            bs58::encode(self.key.sign(message.as_bytes()).to_bytes()).into_string()
        }
    }

    pub struct Harness {
        pub repo: MemoryAuthRepository,
        pub limits: Arc<MemoryRateLimitStore>,
        pub clock: Arc<ManualClock>,
        pub config: Arc<AuthConfig>,
        pub sessions: Arc<SessionIssuer>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_config(AuthConfig::with_random_secret())
        }

        pub fn with_config(config: AuthConfig) -> Self {
            let clock = Arc::new(ManualClock::starting_at_epoch_secs(START));
            let sessions = Arc::new(SessionIssuer::new(&config, clock.clone()));
            Self {
                repo: MemoryAuthRepository::new(),
                limits: Arc::new(MemoryRateLimitStore::new()),
                clock,
                config: Arc::new(config),
                sessions,
            }
        }

        pub fn clock(&self) -> Arc<dyn Clock> {
            self.clock.clone()
        }

        pub async fn challenge(&self, wallet: &str) -> AuthResult<GenerateChallengeOutput> {
            GenerateChallengeUseCase::new(
                Arc::new(self.repo.clone()),
                self.limits.clone(),
                self.config.clone(),
                self.clock(),
            )
            .execute(wallet, &ClientIp(Some("203.0.113.9".parse().unwrap())))
            .await
        }

        pub async fn verify(
            &self,
            wallet: &str,
            signature: String,
            message: String,
        ) -> AuthResult<VerifySignatureOutput> {
            self.verify_named(wallet, signature, message, Some("Phantom".to_string()))
                .await
        }

        pub async fn verify_named(
            &self,
            wallet: &str,
            signature: String,
            message: String,
            wallet_name: Option<String>,
        ) -> AuthResult<VerifySignatureOutput> {
            VerifySignatureUseCase::new(
                Arc::new(self.repo.clone()),
                Arc::new(self.repo.clone()),
                self.sessions.clone(),
                self.clock(),
            )
            .execute(VerifySignatureInput {
                wallet_address: wallet.to_string(),
                signature,
                message,
                wallet_name,
            })
            .await
        }
    }
}

#[cfg(test)]
mod challenge_tests {
    use super::support::*;
    use crate::application::AuthConfig;
    use crate::domain::value_object::challenge_message::ChallengeMessage;
    use crate::error::AuthError;
    use kernel::time::Clock;

    #[tokio::test]
    async fn test_challenge_embeds_wallet_and_nonce() {
        let harness = Harness::new();
        let wallet = Wallet::random();

        let output = harness.challenge(&wallet.address).await.unwrap();
        let parsed = ChallengeMessage::parse(&output.message).unwrap();

        assert_eq!(parsed.nonce, output.nonce);
        assert_eq!(parsed.wallet_address, wallet.address);
        assert_eq!(parsed.domain, "localhost");
        assert_eq!((output.expires_at - harness.clock.now()).num_seconds(), 300);
        assert!(harness.repo.challenge(&output.nonce).is_some());
    }

    #[tokio::test]
    async fn test_malformed_wallet_is_validation_error() {
        let harness = Harness::new();
        for bad in ["", "0x71C7656EC7ab88b098defB751B7401B5f6d8976F", "short"] {
            assert!(matches!(
                harness.challenge(bad).await,
                Err(AuthError::InvalidWalletAddress)
            ));
        }
    }

    #[tokio::test]
    async fn test_challenge_issuance_is_throttled_per_ip() {
        let harness = Harness::with_config(AuthConfig {
            challenge_per_ip_per_minute: 2,
            ..AuthConfig::with_random_secret()
        });
        let wallet = Wallet::random();

        assert!(harness.challenge(&wallet.address).await.is_ok());
        assert!(harness.challenge(&wallet.address).await.is_ok());
        assert!(matches!(
            harness.challenge(&wallet.address).await,
            Err(AuthError::RateLimited)
        ));

        harness.clock.advance(chrono::Duration::seconds(60));
        assert!(harness.challenge(&wallet.address).await.is_ok());
    }
}

#[cfg(test)]
mod verify_tests {
    use super::support::*;
    use chrono::Duration;
    use kernel::error::app_error::AppError;

    use crate::error::AuthError;

    #[tokio::test]
    async fn test_verify_succeeds_exactly_once() {
        let harness = Harness::new();
        let wallet = Wallet::random();
        let challenge = harness.challenge(&wallet.address).await.unwrap();
        let signature = wallet.sign(&challenge.message);

        let output = harness
            .verify(&wallet.address, signature.clone(), challenge.message.clone())
            .await
            .unwrap();
        assert!(output.is_new_user);
        assert_eq!(output.user.wallet_address.as_str(), wallet.address);
        assert_eq!(output.user.wallet_name.as_deref(), Some("Phantom"));

        let identity = harness
            .sessions
            .authenticate(Some(&output.session.token))
            .unwrap();
        assert_eq!(identity.user_id, output.user.user_id);

        let replay = harness
            .verify(&wallet.address, signature, challenge.message)
            .await
            .unwrap_err();
        assert!(matches!(replay, AuthError::ChallengeInvalid));
        assert_eq!(AppError::from(replay).code(), "SIGNATURE_INVALID");
    }

    #[tokio::test]
    async fn test_verify_after_ttl_fails_even_with_valid_signature() {
        let harness = Harness::new();
        let wallet = Wallet::random();
        let challenge = harness.challenge(&wallet.address).await.unwrap();
        let signature = wallet.sign(&challenge.message);

        harness.clock.advance(Duration::seconds(301));

        let err = harness
            .verify(&wallet.address, signature, challenge.message)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeExpired));
        assert_eq!(AppError::from(err).code(), "SIGNATURE_INVALID");
        assert!(harness.repo.challenge(&challenge.nonce).unwrap().is_consumed());
    }

    #[tokio::test]
    async fn test_verify_at_ttl_boundary_succeeds() {
        let harness = Harness::new();
        let wallet = Wallet::random();
        let challenge = harness.challenge(&wallet.address).await.unwrap();
        let signature = wallet.sign(&challenge.message);

        harness.clock.advance(Duration::seconds(300));
        assert!(
            harness
                .verify(&wallet.address, signature, challenge.message)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_failed_attempt_burns_the_challenge() {
        let harness = Harness::new();
        let wallet = Wallet::random();
        let challenge = harness.challenge(&wallet.address).await.unwrap();

        let forged = Wallet::random().sign(&challenge.message);
        assert!(matches!(
            harness
                .verify(&wallet.address, forged, challenge.message.clone())
                .await,
            Err(AuthError::SignatureInvalid)
        ));

        let genuine = wallet.sign(&challenge.message);
        assert!(matches!(
            harness
                .verify(&wallet.address, genuine, challenge.message)
                .await,
            Err(AuthError::ChallengeInvalid)
        ));
    }

    #[tokio::test]
    async fn test_invalid_wallet_name_still_burns_the_challenge() {
        let harness = Harness::new();
        let wallet = Wallet::random();
        let challenge = harness.challenge(&wallet.address).await.unwrap();
        let signature = wallet.sign(&challenge.message);

        let err = harness
            .verify_named(
                &wallet.address,
                signature.clone(),
                challenge.message.clone(),
                Some("w".repeat(65)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(harness.repo.challenge(&challenge.nonce).unwrap().is_consumed());

        let retry = harness
            .verify(&wallet.address, signature, challenge.message)
            .await
            .unwrap_err();
        assert!(matches!(retry, AuthError::ChallengeInvalid));
    }

    #[tokio::test]
    async fn test_challenge_for_another_wallet_is_rejected() {
        let harness = Harness::new();
        let victim = Wallet::random();
        let attacker = Wallet::random();
        let challenge = harness.challenge(&victim.address).await.unwrap();

        let err = harness
            .verify(
                &attacker.address,
                attacker.sign(&challenge.message),
                challenge.message,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeMismatch));
    }

    #[tokio::test]
    async fn test_edited_message_is_rejected() {
        let harness = Harness::new();
        let wallet = Wallet::random();
        let challenge = harness.challenge(&wallet.address).await.unwrap();

        let edited = challenge
            .message
            .replace("Sign this message", "Please sign this message");
        let err = harness
            .verify(&wallet.address, wallet.sign(&edited), edited)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeMismatch));
    }

    #[tokio::test]
    async fn test_unparseable_message() {
        let harness = Harness::new();
        let wallet = Wallet::random();

        let err = harness
            .verify(&wallet.address, wallet.sign("hello"), "hello".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeInvalid));
    }

    #[tokio::test]
    async fn test_returning_user_keeps_identity() {
        let harness = Harness::new();
        let wallet = Wallet::random();

        let first = harness.challenge(&wallet.address).await.unwrap();
        let first = harness
            .verify(&wallet.address, wallet.sign(&first.message), first.message)
            .await
            .unwrap();

        harness.clock.advance(Duration::hours(2));
        let second = harness.challenge(&wallet.address).await.unwrap();
        let second = harness
            .verify(&wallet.address, wallet.sign(&second.message), second.message)
            .await
            .unwrap();

        assert!(!second.is_new_user);
        assert_eq!(second.user.user_id, first.user.user_id);
        assert_eq!(second.user.public_id, first.user.public_id);
        assert_eq!(harness.repo.user_count(), 1);
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::AuthConfig;
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::{AuthAppState, auth_router_generic};
    use kernel::time::ManualClock;
    use platform::rate_limit::MemoryRateLimitStore;
    use std::sync::Arc;

    fn router() -> Router {
        let clock = Arc::new(ManualClock::starting_at_epoch_secs(START));
        auth_router_generic(AuthAppState::new(
            MemoryAuthRepository::new(),
            MemoryRateLimitStore::new(),
            AuthConfig::with_random_secret(),
            clock,
        ))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", "req-auth-1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_full_sign_in_flow() {
        let router = router();
        let wallet = Wallet::random();

        let (status, body) = send(
            &router,
            post("/challenge", json!({ "walletAddress": wallet.address })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["requestId"], "req-auth-1");
        let message = body["data"]["message"].as_str().unwrap().to_string();
        assert!(body["data"]["nonce"].is_string());
        assert!(body["data"]["expiresAt"].is_string());

        let (status, body) = send(
            &router,
            post(
                "/verify",
                json!({
                    "walletAddress": wallet.address,
                    "signature": wallet.sign(&message),
                    "message": message,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isNewUser"], true);
        assert_eq!(body["data"]["user"]["walletAddress"], wallet.address.as_str());
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let request = Request::builder()
            .uri("/session")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["walletAddress"], wallet.address.as_str());
    }

    #[tokio::test]
    async fn test_bad_wallet_envelope() {
        let (status, body) = send(
            &router(),
            post("/challenge", json!({ "walletAddress": "not base58!" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["requestId"], "req-auth-1");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/verify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"walletAddress\":"))
            .unwrap();
        let (status, body) = send(&router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_bad_signature_envelope() {
        let router = router();
        let wallet = Wallet::random();
        let (_, body) = send(
            &router,
            post("/challenge", json!({ "walletAddress": wallet.address })),
        )
        .await;
        let message = body["data"]["message"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            post(
                "/verify",
                json!({
                    "walletAddress": wallet.address,
                    "signature": Wallet::random().sign(&message),
                    "message": message,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "SIGNATURE_INVALID");
    }

    #[tokio::test]
    async fn test_session_requires_token() {
        let request = Request::builder()
            .uri("/session")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

        let request = Request::builder()
            .uri("/session")
            .header(header::AUTHORIZATION, "Bearer v1.bogus.token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_INVALID");
    }
}
