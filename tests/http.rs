use once_cell::sync::Lazy;
use reqwest::Client;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tenpin_league::grid::{balance_view, CellIcon, OrderingPolicy, Reaction, UPDATE_FAILED_ALERT};
use tenpin_league::models::{
    AttendanceRecord, Bowler, CellKey, CellStatus, League, LeagueBook, UpdateResponse,
};
use tenpin_league::sync::{AttendanceClient, GridSession};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "tenpin_league_http_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

/// Thursday Social: $10 per week, $5 fine for missed weeks. Bowler 7 starts
/// with one missed week on the books.
fn seed_book() -> LeagueBook {
    let mut book = LeagueBook::default();
    book.leagues.insert(
        3,
        League {
            name: "Thursday Social".to_string(),
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
            weeks: 6,
            social_fee: 10.0,
            has_fines: true,
            fine_amount: 5.0,
            roster: vec![7, 8, 9, 10, 11],
        },
    );
    for (id, name) in [
        (7, "Pat Keane"),
        (8, "Morgan Reyes"),
        (9, "Sam Whitford"),
        (10, "Lee Okafor"),
        (11, "Jo Tamatea"),
    ] {
        book.bowlers.insert(
            id,
            Bowler {
                name: name.to_string(),
                tba_number: Some(format!("TBA-{id:04}")),
                tba_status: "pending".to_string(),
                tba_last_checked: None,
            },
        );
    }
    book.attendance.push(AttendanceRecord {
        bowler_id: 7,
        league_id: 3,
        week_number: 1,
        status: CellStatus::Missed,
        amount_paid: 0.0,
        fine_paid: false,
    });
    book
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/attendance/3")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    std::fs::write(&data_path, serde_json::to_vec_pretty(&seed_book()).unwrap())
        .expect("write seed data");

    let child = Command::new(env!("CARGO_BIN_EXE_tenpin_league"))
        .env("PORT", port.to_string())
        .env("LEAGUE_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_grid_page_carries_cell_contract() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let page = client
        .get(format!("{}/attendance/3", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(page.contains("Thursday Social"));
    assert!(page.contains(r#"data-bowler="7""#));
    assert!(page.contains(r#"data-week="6""#));
    assert!(page.contains(r#"id="balance-7""#));
    // The seeded missed week renders with its status class and attribute.
    assert!(page.contains(r#"data-status="missed""#));

    let missing = client
        .get(format!("{}/attendance/999", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_primary_click_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let mut session = GridSession::new(
        AttendanceClient::new(server.base_url.clone()),
        OrderingPolicy::ArrivalOrder,
    );
    // Adopt the state the server rendered into the page: bowler 7 already
    // owes $15.00 for the missed week 1.
    session
        .grid_mut()
        .seed_cell(CellKey::new(7, 3, 1), CellStatus::Missed, 0.0);

    let key = CellKey::new(7, 3, 2);
    let (view, reaction) = session.primary_click(key).await;

    assert_eq!(view.icon, Some(CellIcon::Check));
    assert_eq!(view.css_class, Some("paid"));
    assert_eq!(reaction, Reaction::Balance(balance_view(15.0)));
    assert_eq!(session.grid().cell(key).status, CellStatus::Paid);
    assert_eq!(session.grid().balance(7), Some(15.0));
}

#[tokio::test]
async fn http_secondary_click_then_fix() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let mut session = GridSession::new(
        AttendanceClient::new(server.base_url.clone()),
        OrderingPolicy::ArrivalOrder,
    );
    let key = CellKey::new(8, 3, 2);

    let (view, reaction) = session.secondary_click(key).await;
    assert_eq!(view.icon, Some(CellIcon::Cross));
    assert_eq!(view.css_class, Some("missed"));
    assert!(session.grid().fix_offered(key));
    // Missed week: $10 social + $5 fine.
    assert_eq!(reaction, Reaction::Balance(balance_view(15.0)));

    let (view, reaction) = session.fix(key).await.expect("fix affordance attached");
    assert_eq!(view.icon, Some(CellIcon::Wrench));
    assert_eq!(view.css_class, Some("fixed"));
    assert!(!session.grid().fix_offered(key));
    // Fixed week: fine forgiven, social fee still owed.
    assert_eq!(reaction, Reaction::Balance(balance_view(10.0)));
}

#[tokio::test]
async fn http_edit_commit_sends_amount_and_keeps_it() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let mut session = GridSession::new(
        AttendanceClient::new(server.base_url.clone()),
        OrderingPolicy::ArrivalOrder,
    );
    let key = CellKey::new(9, 3, 3);

    let (view, reaction) = session.commit_edit(key, "12.50").await;
    assert_eq!(view.css_class, Some("paid"));
    // Overpaid: the display clamps to the green $0.00.
    assert_eq!(reaction, Reaction::Balance(balance_view(-12.5)));
    assert_eq!(session.grid().cell(key).amount, 12.5);

    // A click-path update carries no amount, so the stored payment stands.
    let (_, reaction) = session.primary_click(key).await;
    assert_eq!(reaction, Reaction::Balance(balance_view(-12.5)));
}

#[tokio::test]
async fn http_update_endpoint_reuses_the_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let url = format!("{}/attendance/update", server.base_url);
    let missed: UpdateResponse = client
        .post(&url)
        .json(&serde_json::json!({
            "bowler_id": 10, "league_id": 3, "week_number": 4, "status": "missed"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(missed.success);
    assert_eq!(missed.balance, Some(15.0));

    // Same cell flips to fixed: one record updated in place, not a second one.
    let fixed: UpdateResponse = client
        .post(&url)
        .json(&serde_json::json!({
            "bowler_id": 10, "league_id": 3, "week_number": 4, "status": "fixed"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fixed.balance, Some(10.0));
}

#[tokio::test]
async fn http_unknown_status_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/attendance/update", server.base_url))
        .json(&serde_json::json!({
            "bowler_id": 11, "league_id": 3, "week_number": 1, "status": "banana"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn http_verify_tba_marks_everyone_valid() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    AttendanceClient::new(server.base_url.clone())
        .verify_tba()
        .await
        .expect("verification round trip");

    let stats: serde_json::Value = client
        .get(format!("{}/api/stats/3", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["tba"]["valid"], 5);
    assert_eq!(stats["tba"]["pending"], 0);
}

#[tokio::test]
async fn failed_update_alerts_and_keeps_optimistic_view() {
    // No server listening here at all.
    let dead_url = format!("http://127.0.0.1:{}", pick_free_port());
    let mut session = GridSession::new(
        AttendanceClient::new(dead_url),
        OrderingPolicy::ArrivalOrder,
    );
    let key = CellKey::new(7, 3, 2);

    let (view, reaction) = session.primary_click(key).await;
    assert_eq!(view.css_class, Some("paid"));
    assert_eq!(reaction, Reaction::Alert(UPDATE_FAILED_ALERT));
    // Optimistic state is not rolled back.
    assert_eq!(session.grid().cell(key).status, CellStatus::Paid);
    assert_eq!(session.grid().balance(7), None);
}
