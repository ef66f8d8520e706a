use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use agora_core::{BoardId, DomainError, UserId};

use crate::cache::PermissionCache;
use crate::capability::{Capability, Decision, RoleSnapshot, evaluate_with};
use crate::catalog::RoleCatalog;
use crate::session::{ResolveError, SessionResolver};
use crate::store::{RoleStore, SessionStore, StoreError, with_deadline};
use crate::{Identity, Role};

/// Why a capability could not be decided.
///
/// `Denied` is deliberately absent: a denial is a [`Decision`], not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("session missing")]
    SessionMissing,

    #[error("store unavailable: {0}")]
    StoreUnavailable(StoreError),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<ResolveError> for AuthzError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::NoSession | ResolveError::SessionNotFound => AuthzError::SessionMissing,
            ResolveError::Store(e) => AuthzError::StoreUnavailable(e),
        }
    }
}

impl From<DomainError> for AuthzError {
    fn from(value: DomainError) -> Self {
        AuthzError::Validation(value.to_string())
    }
}

/// Result of [`AuthorizationEngine::authorize`], shaped for route handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzOutcome {
    Granted,
    Denied,
    SessionMissing,
    /// Indeterminate: a dependency could not be read. Never treat as denied.
    Unavailable(StoreError),
    Invalid(String),
}

impl From<Result<Decision, AuthzError>> for AuthzOutcome {
    fn from(value: Result<Decision, AuthzError>) -> Self {
        match value {
            Ok(Decision::Granted) => AuthzOutcome::Granted,
            Ok(Decision::Denied) => AuthzOutcome::Denied,
            Err(AuthzError::SessionMissing) => AuthzOutcome::SessionMissing,
            Err(AuthzError::StoreUnavailable(e)) => AuthzOutcome::Unavailable(e),
            Err(AuthzError::Validation(message)) => AuthzOutcome::Invalid(message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Deadline applied to each store round-trip (session lookup, role fetch).
    /// `None` waits as long as the caller does.
    pub fetch_timeout: Option<Duration>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves identities and evaluates the capability table.
///
/// Stores are injected at construction; the engine itself holds no mutable
/// state. Everything memoized lives in the caller's [`PermissionCache`].
///
/// Failure semantics:
/// - nothing is evaluated unless the identity resolved;
/// - any store failure (or elapsed deadline) yields `StoreUnavailable`, never a
///   decision;
/// - no retries.
#[derive(Debug)]
pub struct AuthorizationEngine<S, R> {
    resolver: SessionResolver<S>,
    catalog: RoleCatalog<R>,
    config: EngineConfig,
}

impl<S, R> AuthorizationEngine<S, R>
where
    S: SessionStore,
    R: RoleStore,
{
    pub fn new(sessions: S, roles: R, config: EngineConfig) -> Self {
        Self {
            resolver: SessionResolver::new(sessions),
            catalog: RoleCatalog::new(roles),
            config,
        }
    }

    pub fn catalog(&self) -> &RoleCatalog<R> {
        &self.catalog
    }

    /// Decide `capability` for the bearer of `token`.
    pub async fn authorize(
        &self,
        token: Option<&str>,
        board_id: Option<BoardId>,
        capability: Capability,
        cache: &PermissionCache,
    ) -> AuthzOutcome {
        AuthzOutcome::from(self.try_authorize(token, board_id, capability, cache).await)
    }

    /// Same as [`authorize`](Self::authorize), as a `Result` for `?`-style callers.
    pub async fn try_authorize(
        &self,
        token: Option<&str>,
        board_id: Option<BoardId>,
        capability: Capability,
        cache: &PermissionCache,
    ) -> Result<Decision, AuthzError> {
        scoped_board(capability, board_id)?;
        let identity = self.resolve(token, cache).await?;
        self.check(&identity, board_id, capability, cache).await
    }

    /// Resolve the session token, reusing an identity resolved earlier in the
    /// same request.
    pub async fn resolve(
        &self,
        token: Option<&str>,
        cache: &PermissionCache,
    ) -> Result<Identity, AuthzError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());

        if let Some(identity) = token.and_then(|t| cache.identity(t)) {
            return Ok(identity);
        }

        let identity = with_deadline(self.config.fetch_timeout, self.resolver.resolve(token))
            .await
            .map_err(|e| {
                if let ResolveError::Store(store_err) = &e {
                    tracing::warn!(error = %store_err, "session lookup failed");
                }
                AuthzError::from(e)
            })?;

        if let Some(t) = token {
            cache.store_identity(t, identity.clone());
        }
        Ok(identity)
    }

    /// Evaluate a capability for an already-resolved identity.
    pub async fn check(
        &self,
        identity: &Identity,
        board_id: Option<BoardId>,
        capability: Capability,
        cache: &PermissionCache,
    ) -> Result<Decision, AuthzError> {
        let board_id = scoped_board(capability, board_id)?;
        let user_id = identity.user_id;

        if let Some(decision) = cache.decision(user_id, board_id, capability) {
            return Ok(decision);
        }

        let snapshot = self
            .snapshot(user_id, board_id, cache)
            .await
            .map_err(|e| {
                tracing::warn!(
                    %user_id,
                    board_id = ?board_id,
                    %capability,
                    error = %e,
                    "role fetch failed; capability left undecided"
                );
                AuthzError::StoreUnavailable(e)
            })?;

        let decision = decide(user_id, board_id, capability, &snapshot, cache);
        tracing::debug!(
            %user_id,
            board_id = ?board_id,
            %capability,
            decision = ?decision,
            "capability evaluated"
        );
        Ok(decision)
    }

    /// Fetch global roles and, if a board is in scope, board roles.
    ///
    /// The two reads are independent and joined concurrently in the calling
    /// task; the first failure wins and the other read is dropped.
    async fn snapshot(
        &self,
        user_id: UserId,
        board_id: Option<BoardId>,
        cache: &PermissionCache,
    ) -> Result<RoleSnapshot, StoreError> {
        let global = async {
            if let Some(roles) = cache.global_roles(user_id) {
                return Ok(roles);
            }
            let roles = Arc::new(self.catalog.global_roles(user_id).await?);
            cache.store_global_roles(user_id, Arc::clone(&roles));
            Ok::<_, StoreError>(roles)
        };

        let scoped = async {
            let Some(board_id) = board_id else {
                return Ok(Arc::new(HashSet::<Role>::new()));
            };
            if let Some(roles) = cache.board_roles(user_id, board_id) {
                return Ok(roles);
            }
            let roles = Arc::new(self.catalog.board_roles(user_id, board_id).await?);
            cache.store_board_roles(user_id, board_id, Arc::clone(&roles));
            Ok::<_, StoreError>(roles)
        };

        let (global, scoped) = with_deadline(self.config.fetch_timeout, async {
            tokio::try_join!(global, scoped)
        })
        .await?;

        Ok(RoleSnapshot::new((*global).clone(), (*scoped).clone()))
    }
}

/// Board to key a capability on: the board for board-scoped capabilities,
/// `None` for global ones.
fn scoped_board(
    capability: Capability,
    board_id: Option<BoardId>,
) -> Result<Option<BoardId>, AuthzError> {
    match (capability.is_board_scoped(), board_id) {
        (true, None) => Err(AuthzError::Validation(format!(
            "{capability} requires a board id"
        ))),
        (true, board) => Ok(board),
        (false, _) => Ok(None),
    }
}

fn decide(
    user_id: UserId,
    board_id: Option<BoardId>,
    capability: Capability,
    snapshot: &RoleSnapshot,
    cache: &PermissionCache,
) -> Decision {
    let key_board = if capability.is_board_scoped() { board_id } else { None };
    if let Some(decision) = cache.decision(user_id, key_board, capability) {
        return decision;
    }

    let decision = evaluate_with(capability, snapshot, |implied| {
        decide(user_id, board_id, implied, snapshot, cache)
    });
    cache.store_decision(user_id, key_board, capability, decision);
    decision
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;
    use crate::{Session, User};

    // ─────────────────────────────────────────────────────────────────────────
    // Fakes
    // ─────────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeSessions {
        by_token: Mutex<HashMap<String, User>>,
        lookups: AtomicUsize,
        unreachable: bool,
        delay: Option<Duration>,
    }

    impl FakeSessions {
        fn sign_in(&self, name: &str) -> (String, UserId) {
            let now = Utc::now();
            let user = User {
                id: UserId::new(),
                username: name.to_string(),
                password_hash: String::new(),
                created_at: now,
                updated_at: now,
            };
            let token = format!("token-{name}");
            let id = user.id;
            self.by_token.lock().unwrap().insert(token.clone(), user);
            (token, id)
        }
    }

    #[async_trait]
    impl SessionStore for FakeSessions {
        async fn user_by_session_token(&self, token: &str) -> Result<Option<User>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.unreachable {
                return Err(StoreError::unavailable("sessions: connection refused"));
            }
            Ok(self.by_token.lock().unwrap().get(token).cloned())
        }

        async fn upsert_session(&self, _user_id: UserId) -> Result<Session, StoreError> {
            unimplemented!("not used by engine tests")
        }
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl<'a> InFlight<'a> {
        fn enter(counter: &'a AtomicUsize) -> Self {
            counter.fetch_add(1, Ordering::SeqCst);
            Self(counter)
        }
    }

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeRoles {
        global: Mutex<HashMap<UserId, Vec<Role>>>,
        scoped: Mutex<HashMap<(UserId, BoardId), Vec<Role>>>,
        global_fetches: AtomicUsize,
        board_fetches: AtomicUsize,
        in_flight: AtomicUsize,
        fail_board_fetch: bool,
        delay: Option<Duration>,
    }

    impl FakeRoles {
        fn give_global(&self, user: UserId, role: Role) {
            self.global.lock().unwrap().entry(user).or_default().push(role);
        }

        fn give_scoped(&self, user: UserId, board: BoardId, role: Role) {
            self.scoped.lock().unwrap().entry((user, board)).or_default().push(role);
        }

        async fn maybe_wait(&self) {
            if let Some(delay) = self.delay {
                let _guard = InFlight::enter(&self.in_flight);
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl RoleStore for FakeRoles {
        async fn global_roles(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
            self.global_fetches.fetch_add(1, Ordering::SeqCst);
            self.maybe_wait().await;
            Ok(self.global.lock().unwrap().get(&user_id).cloned().unwrap_or_default())
        }

        async fn board_roles(
            &self,
            user_id: UserId,
            board_id: BoardId,
        ) -> Result<Vec<Role>, StoreError> {
            self.board_fetches.fetch_add(1, Ordering::SeqCst);
            self.maybe_wait().await;
            if self.fail_board_fetch {
                return Err(StoreError::unavailable("board_roles: connection reset"));
            }
            Ok(self
                .scoped
                .lock()
                .unwrap()
                .get(&(user_id, board_id))
                .cloned()
                .unwrap_or_default())
        }

        async fn grant_board_role(
            &self,
            user_id: UserId,
            board_id: BoardId,
            role: &Role,
        ) -> Result<(), StoreError> {
            let mut scoped = self.scoped.lock().unwrap();
            let roles = scoped.entry((user_id, board_id)).or_default();
            if !roles.contains(role) {
                roles.push(role.clone());
            }
            Ok(())
        }
    }

    type TestEngine = AuthorizationEngine<Arc<FakeSessions>, Arc<FakeRoles>>;

    type Parts = (TestEngine, Arc<FakeSessions>, Arc<FakeRoles>);

    fn engine_with(roles: FakeRoles, config: EngineConfig) -> Parts {
        engine_from(FakeSessions::default(), roles, config)
    }

    fn engine_from(sessions: FakeSessions, roles: FakeRoles, config: EngineConfig) -> Parts {
        let sessions = Arc::new(sessions);
        let roles = Arc::new(roles);
        let engine = AuthorizationEngine::new(sessions.clone(), roles.clone(), config);
        (engine, sessions, roles)
    }

    fn engine() -> Parts {
        engine_with(FakeRoles::default(), EngineConfig::default())
    }

    async fn ask(
        engine: &TestEngine,
        token: &str,
        board: Option<BoardId>,
        capability: Capability,
    ) -> AuthzOutcome {
        engine
            .authorize(Some(token), board, capability, &PermissionCache::new())
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scenarios
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn user_without_roles_cannot_access_board_details() {
        let (engine, sessions, _roles) = engine();
        let (alice, _) = sessions.sign_in("alice");
        let scovilles = BoardId::new();

        assert_eq!(
            ask(&engine, &alice, Some(scovilles), Capability::CanAccessBoardDetails).await,
            AuthzOutcome::Denied
        );
    }

    #[tokio::test]
    async fn super_admin_accesses_board_details_without_scoped_row() {
        let (engine, sessions, roles) = engine();
        let (bob, bob_id) = sessions.sign_in("bob");
        roles.give_global(bob_id, Role::SUPER_BOARD_ADMIN);

        assert_eq!(
            ask(&engine, &bob, Some(BoardId::new()), Capability::CanAccessBoardDetails).await,
            AuthzOutcome::Granted
        );
    }

    #[tokio::test]
    async fn granted_board_admin_is_scoped_to_that_board() {
        let (engine, sessions, _roles) = engine();
        let (carol, carol_id) = sessions.sign_in("carol");
        let (scovilles, other_board) = (BoardId::new(), BoardId::new());

        engine
            .catalog()
            .grant_board_role(carol_id, scovilles, &Role::BOARD_ADMIN)
            .await
            .unwrap();

        assert_eq!(
            ask(&engine, &carol, Some(scovilles), Capability::IsBoardAdmin).await,
            AuthzOutcome::Granted
        );
        assert_eq!(
            ask(&engine, &carol, Some(other_board), Capability::IsBoardAdmin).await,
            AuthzOutcome::Denied
        );
    }

    #[tokio::test]
    async fn moderator_bypasses_post_approval_only_on_own_board() {
        let (engine, sessions, roles) = engine();
        let (dave, dave_id) = sessions.sign_in("dave");
        let (scovilles, other_board) = (BoardId::new(), BoardId::new());
        roles.give_scoped(dave_id, scovilles, Role::MODERATOR);

        assert_eq!(
            ask(&engine, &dave, Some(scovilles), Capability::CanBypassPostApproval).await,
            AuthzOutcome::Granted
        );
        assert_eq!(
            ask(&engine, &dave, Some(scovilles), Capability::IsBoardAdmin).await,
            AuthzOutcome::Denied
        );
        assert_eq!(
            ask(&engine, &dave, Some(other_board), Capability::CanBypassPostApproval).await,
            AuthzOutcome::Denied
        );
    }

    #[tokio::test(start_paused = true)]
    async fn role_store_timeout_is_unavailable() {
        let (engine, sessions, _roles) = engine_with(
            FakeRoles {
                delay: Some(Duration::from_secs(30)),
                ..Default::default()
            },
            EngineConfig {
                fetch_timeout: Some(Duration::from_millis(250)),
            },
        );
        let (token, _) = sessions.sign_in("erin");

        let board = Some(BoardId::new());
        let outcome = ask(&engine, &token, board, Capability::CanAccessBoardDetails).await;
        assert_eq!(outcome, AuthzOutcome::Unavailable(StoreError::Timeout));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Failure semantics
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn store_error_is_never_granted_even_for_super_admin() {
        let (engine, sessions, roles) = engine_with(
            FakeRoles {
                fail_board_fetch: true,
                ..Default::default()
            },
            EngineConfig::default(),
        );
        let (token, user) = sessions.sign_in("frank");
        roles.give_global(user, Role::SUPER_BOARD_ADMIN);

        let cache = PermissionCache::new();
        let result = engine
            .try_authorize(
                Some(token.as_str()),
                Some(BoardId::new()),
                Capability::CanAccessBoardDetails,
                &cache,
            )
            .await;

        assert!(matches!(result, Err(AuthzError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (engine, sessions, _roles) = engine_with(
            FakeRoles {
                fail_board_fetch: true,
                ..Default::default()
            },
            EngineConfig::default(),
        );
        let (token, _) = sessions.sign_in("gina");
        let cache = PermissionCache::new();
        let board = Some(BoardId::new());

        for _ in 0..2 {
            let outcome = engine
                .authorize(Some(token.as_str()), board, Capability::IsBoardModerator, &cache)
                .await;
            assert!(matches!(outcome, AuthzOutcome::Unavailable(_)));
        }
        assert_eq!(engine.catalog().store().board_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_or_unknown_session_stops_before_role_fetch() {
        let (engine, _sessions, roles) = engine();
        let board = Some(BoardId::new());
        let cache = PermissionCache::new();

        assert_eq!(
            engine.authorize(None, board, Capability::CanAccessBoardDetails, &cache).await,
            AuthzOutcome::SessionMissing
        );
        assert_eq!(
            engine
                .authorize(Some("stale"), board, Capability::CanAccessBoardDetails, &cache)
                .await,
            AuthzOutcome::SessionMissing
        );
        assert_eq!(roles.global_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(roles.board_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_session_store_is_unavailable_not_missing() {
        let (engine, sessions, roles) = engine_from(
            FakeSessions {
                unreachable: true,
                ..Default::default()
            },
            FakeRoles::default(),
            EngineConfig::default(),
        );
        let board = Some(BoardId::new());

        let outcome = ask(&engine, "token-olga", board, Capability::CanAccessBoardDetails).await;

        assert!(matches!(outcome, AuthzOutcome::Unavailable(StoreError::Unavailable(_))));
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(roles.global_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(roles.board_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn session_lookup_timeout_is_unavailable() {
        let (engine, sessions, roles) = engine_from(
            FakeSessions {
                delay: Some(Duration::from_secs(30)),
                ..Default::default()
            },
            FakeRoles::default(),
            EngineConfig {
                fetch_timeout: Some(Duration::from_millis(250)),
            },
        );
        let (token, _) = sessions.sign_in("pat");
        let cache = PermissionCache::new();

        let outcome = engine
            .authorize(Some(token.as_str()), None, Capability::IsUserAdmin, &cache)
            .await;

        assert_eq!(outcome, AuthzOutcome::Unavailable(StoreError::Timeout));
        assert!(cache.identity(&token).is_none());
        assert_eq!(roles.global_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn board_capability_without_board_is_invalid() {
        let (engine, sessions, _roles) = engine();
        let (token, _) = sessions.sign_in("hank");

        let outcome = ask(&engine, &token, None, Capability::CanBypassPostApproval).await;
        assert!(matches!(outcome, AuthzOutcome::Invalid(_)));
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn global_capability_ignores_board_and_skips_board_fetch() {
        let (engine, sessions, roles) = engine();
        let (token, user) = sessions.sign_in("ivy");
        roles.give_global(user, Role::USER_ADMIN);

        assert_eq!(
            ask(&engine, &token, Some(BoardId::new()), Capability::IsUserAdmin).await,
            AuthzOutcome::Granted
        );
        assert_eq!(roles.board_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_leaves_no_fetch_running() {
        let (engine, sessions, roles) = engine_with(
            FakeRoles {
                delay: Some(Duration::from_secs(5)),
                ..Default::default()
            },
            EngineConfig::default(),
        );
        let (token, user) = sessions.sign_in("jack");
        let board = BoardId::new();
        let cache = PermissionCache::new();

        let request =
            engine.authorize(Some(token.as_str()), Some(board), Capability::IsBoardAdmin, &cache);
        let cancelled = tokio::time::timeout(Duration::from_millis(10), request).await;

        assert!(cancelled.is_err());
        assert_eq!(roles.global_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(roles.in_flight.load(Ordering::SeqCst), 0);
        assert!(cache.decision(user, Some(board), Capability::IsBoardAdmin).is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request-scoped cache
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn one_request_resolves_and_fetches_once() {
        let (engine, sessions, roles) = engine();
        let (token, user) = sessions.sign_in("kim");
        let board = Some(BoardId::new());
        roles.give_scoped(user, board.unwrap(), Role::BOARD_ADMIN);
        let cache = PermissionCache::new();

        for capability in [
            Capability::CanBypassPostApproval,
            Capability::CanAccessBoardDetails,
            Capability::IsBoardAdmin,
            Capability::IsSuperBoardAdmin,
        ] {
            engine.authorize(Some(token.as_str()), board, capability, &cache).await;
        }

        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(roles.global_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(roles.board_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.decision(user, board, Capability::CanAccessBoardDetails),
            Some(Decision::Granted)
        );
    }

    #[tokio::test]
    async fn new_request_sees_new_grants() {
        let (engine, sessions, _roles) = engine();
        let (token, user) = sessions.sign_in("lee");
        let board = BoardId::new();

        let first = PermissionCache::new();
        assert_eq!(
            engine
                .authorize(Some(token.as_str()), Some(board), Capability::IsBoardAdmin, &first)
                .await,
            AuthzOutcome::Denied
        );

        engine
            .catalog()
            .grant_board_role(user, board, &Role::BOARD_ADMIN)
            .await
            .unwrap();

        let second = PermissionCache::new();
        assert_eq!(
            engine
                .authorize(Some(token.as_str()), Some(board), Capability::IsBoardAdmin, &second)
                .await,
            AuthzOutcome::Granted
        );
    }

    #[tokio::test]
    async fn resolve_is_stable_within_a_request() {
        let (engine, sessions, _roles) = engine();
        let (token, user) = sessions.sign_in("mia");
        let cache = PermissionCache::new();

        let padded = format!("  {token} ");
        let first = engine.resolve(Some(token.as_str()), &cache).await.unwrap();
        let second = engine.resolve(Some(padded.as_str()), &cache).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.user_id, user);
        assert_eq!(sessions.lookups.load(Ordering::SeqCst), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────────

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: a user with no grants is denied board details on every board.
        #[test]
        fn roleless_user_denied_on_every_board(boards in 1usize..8) {
            block_on(async {
                let (engine, sessions, _roles) = engine();
                let (token, _) = sessions.sign_in("nobody");
                for _ in 0..boards {
                    let board = Some(BoardId::new());
                    let outcome =
                        ask(&engine, &token, board, Capability::CanAccessBoardDetails).await;
                    assert_eq!(outcome, AuthzOutcome::Denied);
                }
            });
        }

        /// Property: super admins are granted board details on every board,
        /// whatever scoped rows exist elsewhere.
        #[test]
        fn super_admin_granted_on_every_board(
            boards in 1usize..8,
            moderated in prop::collection::vec(any::<bool>(), 8),
        ) {
            block_on(async {
                let (engine, sessions, roles) = engine();
                let (token, user) = sessions.sign_in("root");
                roles.give_global(user, Role::SUPER_BOARD_ADMIN);
                for i in 0..boards {
                    let board = BoardId::new();
                    if moderated[i] {
                        roles.give_scoped(user, board, Role::MODERATOR);
                    }
                    let outcome =
                        ask(&engine, &token, Some(board), Capability::CanAccessBoardDetails).await;
                    assert_eq!(outcome, AuthzOutcome::Granted);
                }
            });
        }
    }
}
