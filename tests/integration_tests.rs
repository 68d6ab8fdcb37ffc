//! Integration tests for the assassins game server
//!
//! These tests verify end-to-end behavior of the kill-claim engine,
//! including chain maintenance, visibility rules, concurrent submissions,
//! corruption detection, and the HTTP API.

use assassins::database::{ClaimLedger, NotificationLog, PlayerStore};
use assassins::{
    check_chain, create_app, ClaimFilter, Credentials, Game, GameError, KillClaim, MemoryStore,
    Player, SecurityMiddlewareConfig, SecurityState,
};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

const ADMIN: &str = "root";

fn creds(alias: &str) -> Credentials {
    Credentials::new(alias, &format!("{}-code", alias), &format!("{}-passphrase", alias))
}

fn player(alias: &str) -> Player {
    let c = creds(alias);
    Player::new(alias, &alias.to_uppercase(), &c.codename, &c.passphrase)
}

/// Players in one target cycle, in the given order, plus an admin
fn ring(aliases: &[&str]) -> Vec<Player> {
    let mut players: Vec<Player> = aliases
        .iter()
        .enumerate()
        .map(|(i, alias)| player(alias).with_target(aliases[(i + 1) % aliases.len()]))
        .collect();
    let c = creds(ADMIN);
    players.push(Player::admin(ADMIN, "Root", &c.codename, &c.passphrase));
    players
}

fn create_game(players: Vec<Player>) -> (Arc<MemoryStore>, Game<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_players(players));
    let game = Game::new(store.clone(), 64);
    (store, game)
}

/// Player records with storage revisions cleared
async fn snapshot(store: &MemoryStore) -> Vec<Player> {
    store
        .all_players()
        .await
        .into_iter()
        .map(|mut p| {
            p.revision = 0;
            p
        })
        .collect()
}

async fn self_report(game: &Game<MemoryStore>, alias: &str) -> Result<(), GameError> {
    game.kills
        .put(&creds(alias), KillClaim::new(alias, alias))
        .await
        .map(|_| ())
}

// ============================================================================
// Kill Claim Flows
// ============================================================================

mod kill_claims {
    use super::*;

    #[tokio::test]
    async fn test_self_report_relinks_chain() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        let report = game
            .kills
            .put(&creds("b"), KillClaim::new("b", "b"))
            .await
            .unwrap();
        assert_eq!(report.reporter, "b");
        assert!(report.timestamp > 0);

        let a = store.get_one("a").await.unwrap();
        let b = store.get_one("b").await.unwrap();
        assert_eq!(a.target, "c");
        assert_eq!(a.kills, 1);
        assert!(!b.alive);
        assert_eq!(b.target, "");

        let messages = store.messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "b appears to be dead...");
        assert_eq!(messages[0].reporter, "b");
        assert_eq!(messages[0].timestamp, report.timestamp);
    }

    #[tokio::test]
    async fn test_killer_claim_changes_no_state() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));
        let before = snapshot(&store).await;

        game.kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();

        assert_eq!(snapshot(&store).await, before);
        assert!(store.messages().await.unwrap().is_empty());
        assert_eq!(store.claim_count("a", "b").await, 1);
    }

    #[tokio::test]
    async fn test_killer_claim_then_self_report() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        game.kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();
        self_report(&game, "b").await.unwrap();

        assert_eq!(store.get_one("a").await.unwrap().target, "c");
        assert_eq!(store.claim_count("a", "b").await, 1);
        assert_eq!(store.claim_count("b", "b").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_claim_rejected() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));
        let claim = KillClaim::new("a", "b");

        game.kills.put(&creds("a"), claim.clone()).await.unwrap();
        let err = game.kills.put(&creds("b"), claim.clone()).await.unwrap_err();

        assert_eq!(err, GameError::ClaimAlreadyExists(claim));
        assert_eq!(store.claim_count("a", "b").await, 1);
    }

    #[tokio::test]
    async fn test_outsider_permission_denied() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        let err = game
            .kills
            .put(&creds("c"), KillClaim::new("a", "b"))
            .await
            .unwrap_err();

        assert_eq!(err, GameError::PermissionDenied);
        assert_eq!(store.claim_count("a", "b").await, 0);
    }

    #[tokio::test]
    async fn test_admin_may_claim_for_others() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        let report = game
            .kills
            .put(&creds(ADMIN), KillClaim::new("c", "c"))
            .await
            .unwrap();

        assert_eq!(report.reporter, ADMIN);
        assert!(!store.get_one("c").await.unwrap().alive);
        assert_eq!(store.get_one("b").await.unwrap().target, "a");
    }

    #[tokio::test]
    async fn test_dead_killer_reported_first() {
        let (_, game) = create_game(ring(&["a", "b", "c", "d"]));
        self_report(&game, "b").await.unwrap();
        self_report(&game, "d").await.unwrap();

        let err = game
            .kills
            .put(&creds(ADMIN), KillClaim::new("b", "d"))
            .await
            .unwrap_err();
        assert_eq!(err, GameError::UsersDead("b".to_string()));

        let err = game
            .kills
            .put(&creds("a"), KillClaim::new("a", "d"))
            .await
            .unwrap_err();
        assert_eq!(err, GameError::UsersDead("d".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_alias_not_found() {
        let (_, game) = create_game(ring(&["a", "b"]));

        let err = game
            .kills
            .put(&creds("a"), KillClaim::new("a", "ghost"))
            .await
            .unwrap_err();
        assert_eq!(err, GameError::NotFound("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_bad_credentials_not_authorized() {
        let (_, game) = create_game(ring(&["a", "b"]));

        let forged = Credentials::new("a", "a-code", "guess");
        let err = game
            .kills
            .put(&forged, KillClaim::new("a", "a"))
            .await
            .unwrap_err();
        assert_eq!(err, GameError::NotAuthorized);
    }

    #[tokio::test]
    async fn test_report_timestamps_never_decrease() {
        let (_, game) = create_game(ring(&["a", "b", "c", "d"]));

        let first = game
            .kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();
        let second = game
            .kills
            .put(&creds("c"), KillClaim::new("c", "d"))
            .await
            .unwrap();
        assert!(second.timestamp >= first.timestamp);
    }
}

// ============================================================================
// Visibility
// ============================================================================

mod visibility {
    use super::*;

    #[tokio::test]
    async fn test_victim_sees_redacted_claim() {
        let (_, game) = create_game(ring(&["a", "b", "c"]));
        game.kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();

        let seen = game
            .kills
            .get(&creds("b"), &ClaimFilter::default())
            .await
            .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].killer, None);
        assert_eq!(seen[0].victim, "b");

        let json = serde_json::to_value(&seen[0]).unwrap();
        assert!(json.get("killer").is_none());
    }

    #[tokio::test]
    async fn test_killer_and_admin_see_full_claim() {
        let (_, game) = create_game(ring(&["a", "b", "c"]));
        game.kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();

        for alias in ["a", ADMIN] {
            let seen = game
                .kills
                .get(&creds(alias), &ClaimFilter::default())
                .await
                .unwrap();
            assert_eq!(seen, vec![KillClaim::new("a", "b")], "as {}", alias);
        }
    }

    #[tokio::test]
    async fn test_uninvolved_player_sees_nothing() {
        let (_, game) = create_game(ring(&["a", "b", "c"]));
        game.kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();

        let seen = game
            .kills
            .get(&creds("c"), &ClaimFilter::default())
            .await
            .unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_self_reporter_sees_own_claim_unredacted() {
        let (_, game) = create_game(ring(&["a", "b", "c"]));
        self_report(&game, "b").await.unwrap();

        let seen = game
            .kills
            .get(&creds("b"), &ClaimFilter::default())
            .await
            .unwrap();
        assert_eq!(seen, vec![KillClaim::new("b", "b")]);
    }

    #[tokio::test]
    async fn test_admin_filter_applies() {
        let (_, game) = create_game(ring(&["a", "b", "c"]));
        game.kills
            .put(&creds("a"), KillClaim::new("a", "b"))
            .await
            .unwrap();
        game.kills
            .put(&creds("b"), KillClaim::new("b", "c"))
            .await
            .unwrap();

        let filter = ClaimFilter {
            killer: Some("b".to_string()),
            victim: None,
        };
        let seen = game.kills.get(&creds(ADMIN), &filter).await.unwrap();
        assert_eq!(seen, vec![KillClaim::new("b", "c")]);
    }
}

// ============================================================================
// Chain Invariants
// ============================================================================

mod chain_invariants {
    use super::*;

    #[tokio::test]
    async fn test_permutation_holds_between_puts() {
        let aliases = ["a", "b", "c", "d", "e", "f"];
        let (store, game) = create_game(ring(&aliases));

        for (i, victim) in ["c", "a", "f", "b"].iter().enumerate() {
            self_report(&game, victim).await.unwrap();

            let report = check_chain(&store.all_players().await);
            assert!(report.is_intact(), "{:?}", report.violations);
            assert_eq!(report.cycles, 1);
            assert_eq!(report.alive, aliases.len() - i - 1);
        }

        let alive: Vec<Player> = store
            .all_players()
            .await
            .into_iter()
            .filter(|p| p.alive && !p.admin)
            .collect();
        let aliases: Vec<&str> = alive.iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["d", "e"]);
        assert_eq!(alive[0].target, "e");
        assert_eq!(alive[1].target, "d");
    }

    #[tokio::test]
    async fn test_last_player_self_report() {
        let (store, game) = create_game(ring(&["a", "b"]));

        self_report(&game, "b").await.unwrap();
        let a = store.get_one("a").await.unwrap();
        assert_eq!(a.target, "a");
        assert_eq!(a.kills, 1);

        self_report(&game, "a").await.unwrap();
        let a = store.get_one("a").await.unwrap();
        assert!(!a.alive);
        assert_eq!(a.target, "");
        assert_eq!(a.kills, 1);

        assert!(check_chain(&store.all_players().await).is_intact());
        assert_eq!(store.messages().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_start_game_then_play() {
        let mut players: Vec<Player> = ["a", "b", "c", "d"].iter().map(|a| player(a)).collect();
        let c = creds(ADMIN);
        players.push(Player::admin(ADMIN, "Root", &c.codename, &c.passphrase));
        let (store, game) = create_game(players);

        let started = game.players.start_game(&creds(ADMIN)).await.unwrap();
        assert!(started.is_intact());
        assert_eq!(started.alive, 4);

        self_report(&game, "c").await.unwrap();
        let status = game.players.chain_status(&creds(ADMIN)).await.unwrap();
        assert!(status.is_intact());
        assert_eq!(status.alive, 3);
        assert_eq!(status.cycles, 1);
        assert!(store.get_one(ADMIN).await.unwrap().target.is_empty());
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_self_reports_keep_chain_intact() {
        let aliases: Vec<String> = (0..16).map(|i| format!("p{:02}", i)).collect();
        let refs: Vec<&str> = aliases.iter().map(|s| s.as_str()).collect();
        let (store, game) = create_game(ring(&refs));

        // Adjacent victims force predecessor changes mid-flight
        let victims = ["p01", "p02", "p03", "p06", "p09", "p12"];
        let mut handles = Vec::new();
        for victim in victims {
            let game = game.clone();
            handles.push(tokio::spawn(async move { self_report(&game, victim).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let report = check_chain(&store.all_players().await);
        assert!(report.is_intact(), "{:?}", report.violations);
        assert_eq!(report.alive, 10);
        assert_eq!(report.cycles, 1);

        // Credit goes to whoever preceded each victim at commit time
        let players = store.all_players().await;
        let kills: u32 = players.iter().map(|p| p.kills).sum();
        assert_eq!(kills as usize, victims.len());
        assert_eq!(store.get_one("p00").await.unwrap().target, "p04");
        assert_eq!(store.messages().await.unwrap().len(), victims.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_single_entry() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        let mut handles = Vec::new();
        for i in 0..8 {
            let game = game.clone();
            let submitter = if i % 2 == 0 { "a" } else { "b" };
            handles.push(tokio::spawn(async move {
                game.kills
                    .put(&creds(submitter), KillClaim::new("a", "b"))
                    .await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert!(matches!(e, GameError::ClaimAlreadyExists(_))),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(store.claim_count("a", "b").await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_self_report_notifies_once() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let game = game.clone();
            handles.push(tokio::spawn(async move { self_report(&game, "b").await }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(store.messages().await.unwrap().len(), 1);
        assert_eq!(store.get_one("a").await.unwrap().kills, 1);
    }
}

// ============================================================================
// Corruption Detection
// ============================================================================

mod corruption {
    use super::*;

    #[tokio::test]
    async fn test_two_predecessors_unknown_without_writes() {
        let mut players = ring(&["a", "b", "c"]);
        // c now also targets b
        if let Some(c) = players.iter_mut().find(|p| p.alias == "c") {
            c.target = "b".to_string();
        }
        let (store, game) = create_game(players);
        let before = store.all_players().await;

        let err = self_report(&game, "b").await.unwrap_err();

        assert!(matches!(err, GameError::Unknown(ref detail) if detail.contains("b")));
        assert!(err.is_internal());
        assert_eq!(store.all_players().await, before);
        assert_eq!(store.claim_count("b", "b").await, 0);
        assert!(store.messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orphaned_victim_unknown() {
        let mut players = ring(&["a", "b", "c"]);
        if let Some(a) = players.iter_mut().find(|p| p.alias == "a") {
            a.target = "c".to_string();
        }
        let (store, game) = create_game(players);

        let err = self_report(&game, "b").await.unwrap_err();
        assert!(matches!(err, GameError::Unknown(_)));
        assert!(store.get_one("b").await.unwrap().alive);

        let audit = game.players.chain_status(&creds(ADMIN)).await.unwrap();
        assert!(!audit.is_intact());
    }

    #[tokio::test]
    async fn test_ledger_untouched_by_rejected_claims() {
        let (store, game) = create_game(ring(&["a", "b", "c"]));

        let _ = game.kills.put(&creds("c"), KillClaim::new("a", "b")).await;
        let _ = game.kills.put(&creds("a"), KillClaim::new("a", "zed")).await;

        let all = store.find(&ClaimFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }
}

// ============================================================================
// HTTP API
// ============================================================================

mod http_api {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Arc<MemoryStore>, Router) {
        app_with(ring(&["a", "b", "c"]))
    }

    /// Players registered but no targets assigned yet
    fn lobby() -> (Arc<MemoryStore>, Router) {
        let c = creds(ADMIN);
        app_with(vec![
            player("a"),
            player("b"),
            Player::admin(ADMIN, "Root", &c.codename, &c.passphrase),
        ])
    }

    fn app_with(players: Vec<Player>) -> (Arc<MemoryStore>, Router) {
        let (store, game) = create_game(players);
        let security = SecurityState::new(SecurityMiddlewareConfig {
            log_requests: false,
            ..SecurityMiddlewareConfig::default()
        });
        (store, create_app(game, security))
    }

    fn query(alias: &str) -> String {
        let c = creds(alias);
        format!(
            "alias={}&codename={}&passphrase={}",
            c.alias, c.codename, c.passphrase
        )
    }

    fn put_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_api_ack_and_health() {
        let (_, app) = app();

        let response = app.clone().oneshot(get("/api")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ACK");

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_put_self_report_over_http() {
        let (store, app) = app();

        let response = app
            .clone()
            .oneshot(put_json(
                "/api/kills",
                json!({
                    "credentials": creds("b"),
                    "data": { "killer": "b", "victim": "b" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        assert_eq!(report["reporter"], "b");
        assert_eq!(report["data"]["victim"], "b");

        assert!(!store.get_one("b").await.unwrap().alive);

        let uri = format!("/api/messages?{}", query("c"));
        let response = app.oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let messages = body_json(response).await;
        assert_eq!(messages[0]["data"], "b appears to be dead...");
    }

    #[tokio::test]
    async fn test_error_body_and_status() {
        let (_, app) = app();

        let response = app
            .clone()
            .oneshot(put_json(
                "/api/kills",
                json!({
                    "credentials": { "alias": "a", "codename": "a-code", "passphrase": "nope" },
                    "data": { "killer": "a", "victim": "b" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Not authorized." }));

        let response = app
            .oneshot(put_json(
                "/api/kills",
                json!({
                    "credentials": creds("c"),
                    "data": { "killer": "a", "victim": "b" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_kills_redacts_for_victim() {
        let (_, app) = app();

        let response = app
            .clone()
            .oneshot(put_json(
                "/api/kills",
                json!({
                    "credentials": creds("a"),
                    "data": { "killer": "a", "victim": "b" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let uri = format!("/api/kills?{}&victim=b", query("b"));
        let claims = body_json(app.oneshot(get(&uri)).await.unwrap()).await;
        assert_eq!(claims, json!([{ "victim": "b" }]));
    }

    #[tokio::test]
    async fn test_messages_put_unsupported() {
        let (_, app) = app();

        let response = app
            .oneshot(put_json(
                "/api/messages",
                json!({ "credentials": creds("a"), "data": "hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_, app) = lobby();

        let response = app
            .clone()
            .oneshot(put_json(
                "/api/players",
                json!({
                    "credentials": creds("dave"),
                    "data": {
                        "alias": "dave",
                        "nickname": "Dave",
                        "codename": "dave-code",
                        "passphrase": "dave-passphrase"
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json("/api/login", json!({ "credentials": creds("dave") })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let me = body_json(response).await;
        assert_eq!(me["nickname"], "Dave");
        assert_eq!(me["alive"], true);

        let response = app
            .oneshot(post_json(
                "/api/login",
                json!({ "credentials": { "alias": "dave", "codename": "x", "passphrase": "y" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_registration_rejected_after_start() {
        let (store, app) = app();

        let response = app
            .oneshot(put_json(
                "/api/players",
                json!({
                    "credentials": creds("late"),
                    "data": {
                        "alias": "late",
                        "codename": "late-code",
                        "passphrase": "late-passphrase"
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.get_one("late").await.is_err());
    }

    #[tokio::test]
    async fn test_players_query_hides_other_secrets() {
        let (_, app) = app();

        let uri = format!("/api/players?{}&player=b", query("a"));
        let players = body_json(app.clone().oneshot(get(&uri)).await.unwrap()).await;
        assert_eq!(players[0]["alias"], "b");
        assert_eq!(players[0]["passphrase"], "");
        assert_eq!(players[0]["target"], "");

        let uri = format!("/api/players?{}&alive=true", query(ADMIN));
        let players = body_json(app.oneshot(get(&uri)).await.unwrap()).await;
        let players = players.as_array().unwrap();
        assert_eq!(players.len(), 4);
        for p in players.iter().filter(|p| p["alias"] != ADMIN) {
            assert_eq!(p["passphrase"], "");
            assert_ne!(p["target"], "");
        }
    }

    #[tokio::test]
    async fn test_chain_status_admin_only() {
        let (_, app) = app();

        let uri = format!("/api/game/chain?{}", query(ADMIN));
        let response = app.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        assert_eq!(status["alive"], 3);
        assert_eq!(status["violations"], json!([]));

        let uri = format!("/api/game/chain?{}", query("a"));
        let response = app.oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let (_, app) = app();

        let padding = "x".repeat(SecurityMiddlewareConfig::default().max_request_size + 1);
        let body = json!({ "credentials": creds("a"), "data": { "killer": "a", "victim": padding } })
            .to_string();
        let request = Request::builder()
            .method("PUT")
            .uri("/api/kills")
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
