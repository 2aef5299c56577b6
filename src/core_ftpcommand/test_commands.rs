//! End-to-end command tests: scripts fed through the real dispatch loop
//! over an in-memory control connection, with a recording filesystem and
//! recording hooks. Transfer commands run against the local-disk backend
//! and real loopback data sockets.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::core_network::network::SessionEnd;
use crate::core_plugin::{PluginChain, Verdict};
use crate::core_vfs::native::NativeFileSystemFactory;
use crate::core_vfs::FileSystemFactory;
use crate::session::Session;
use crate::testutil::{
    run_session, test_context, test_context_with, test_session_with, MockEntry, MockFsState,
    RecordingHook,
};

fn logged_in(state: MockFsState) -> Session {
    let mut session = test_session_with(state);
    session.username = Some(String::from("alice"));
    session
}

fn reply_lines(output: &str) -> Vec<&str> {
    output
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .collect()
}

#[tokio::test]
async fn missing_argument_is_one_501_with_no_side_effects() {
    let state = MockFsState::default();
    let hook = RecordingHook::new("audit");
    let events = hook.events();
    let mut plugins = PluginChain::new();
    plugins.push(Box::new(hook));
    let ctx = test_context_with(state.clone(), plugins);
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "DELE\r\n").await;

    assert_eq!(
        reply_lines(&output),
        ["501 Syntax error in parameters or arguments."]
    );
    assert!(state.resolves().is_empty());
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(ctx.stats.snapshot().files_deleted, 0);
}

#[tokio::test]
async fn dele_unresolvable_is_one_550_pre_hook_only() {
    let state = MockFsState::default();
    let hook = RecordingHook::new("audit");
    let events = hook.events();
    let mut plugins = PluginChain::new();
    plugins.push(Box::new(hook));
    let ctx = test_context_with(state.clone(), plugins);
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "DELE missing.txt\r\n").await;

    let lines = reply_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("550 "));
    assert!(lines[0].contains("missing.txt"));
    assert_eq!(ctx.stats.snapshot().files_deleted, 0);
    assert_eq!(events.lock().unwrap().as_slice(), ["audit:start:DELE"]);
}

#[tokio::test]
async fn dele_without_permission_is_one_450_and_no_delete_call() {
    let state = MockFsState::default();
    state.add("/locked.txt", MockEntry::file().protected());
    let ctx = test_context();
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "DELE locked.txt\r\n").await;

    let lines = reply_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("450 "));
    assert!(lines[0].contains("/locked.txt"));
    assert!(state.deleted().is_empty());
    assert!(state.contains("/locked.txt"));
}

#[tokio::test]
async fn dele_failure_from_the_backend_is_one_450() {
    let state = MockFsState::default();
    state.add("/stuck.txt", MockEntry::file().failing_delete());
    let ctx = test_context();
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "DELE stuck.txt\r\n").await;

    let lines = reply_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("450 "));
    assert_eq!(ctx.stats.snapshot().files_deleted, 0);
}

#[tokio::test]
async fn dele_success_is_one_250_one_stat_and_both_hooks_in_order() {
    let state = MockFsState::default();
    state.add("/tmp/report.txt", MockEntry::file());
    let hook = RecordingHook::new("audit");
    let events = hook.events();
    let mut plugins = PluginChain::new();
    plugins.push(Box::new(hook));
    let ctx = test_context_with(state.clone(), plugins);
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "DELE /tmp/report.txt\r\n").await;

    assert_eq!(reply_lines(&output), ["250 \"/tmp/report.txt\" deleted."]);
    assert_eq!(ctx.stats.snapshot().files_deleted, 1);
    assert_eq!(state.deleted(), ["/tmp/report.txt"]);
    assert_eq!(
        events.lock().unwrap().as_slice(),
        ["audit:start:DELE", "audit:end:DELE"]
    );
}

#[tokio::test]
async fn pre_hook_skip_is_one_450_naming_the_raw_argument() {
    let state = MockFsState::default();
    state.add("/tmp/report.txt", MockEntry::file());
    let hook = RecordingHook::new("veto");
    hook.set_start_verdict(Verdict::Skip);
    let mut plugins = PluginChain::new();
    plugins.push(Box::new(hook));
    let ctx = test_context_with(state.clone(), plugins);
    let mut session = logged_in(state.clone());

    // the relative raw argument, not the resolved canonical name
    let (_, output) = run_session(&ctx, &mut session, "DELE tmp/report.txt\r\n").await;

    let lines = reply_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("450 "));
    assert!(lines[0].contains("tmp/report.txt"));
    assert!(state.resolves().is_empty());
    assert!(state.contains("/tmp/report.txt"));
}

#[tokio::test]
async fn pre_hook_disconnect_writes_nothing_and_closes() {
    let state = MockFsState::default();
    state.add("/tmp/report.txt", MockEntry::file());
    let hook = RecordingHook::new("kill");
    hook.set_start_verdict(Verdict::Disconnect);
    let mut plugins = PluginChain::new();
    plugins.push(Box::new(hook));
    let ctx = test_context_with(state.clone(), plugins);
    let mut session = logged_in(state.clone());

    let (end, output) = run_session(&ctx, &mut session, "DELE /tmp/report.txt\r\n").await;

    assert_eq!(end, SessionEnd::ForcedClose);
    assert_eq!(output, "");
    assert!(state.resolves().is_empty());
}

#[tokio::test]
async fn post_hook_disconnect_closes_after_the_success_reply() {
    let state = MockFsState::default();
    state.add("/a.txt", MockEntry::file());
    let hook = RecordingHook::new("kill");
    hook.set_end_verdict(Verdict::Disconnect);
    let mut plugins = PluginChain::new();
    plugins.push(Box::new(hook));
    let ctx = test_context_with(state.clone(), plugins);
    let mut session = logged_in(state.clone());

    let (end, output) = run_session(&ctx, &mut session, "DELE /a.txt\r\nNOOP\r\n").await;

    assert_eq!(end, SessionEnd::ForcedClose);
    // the 250 went out, the NOOP after it was never processed
    assert_eq!(reply_lines(&output), ["250 \"/a.txt\" deleted."]);
    assert_eq!(ctx.stats.snapshot().files_deleted, 1);
}

#[tokio::test]
async fn login_sequence_and_statistics() {
    let ctx = test_context();
    let mut session = test_session_with(MockFsState::default());

    let (end, output) = run_session(
        &ctx,
        &mut session,
        "USER alice\r\nPASS secret\r\nPWD\r\nQUIT\r\n",
    )
    .await;

    assert_eq!(end, SessionEnd::Quit);
    let lines = reply_lines(&output);
    assert!(lines[0].starts_with("331 "));
    assert_eq!(lines[1], "230 User alice logged in, proceed.");
    assert_eq!(lines[2], "257 \"/\" is the current directory.");
    assert!(lines[3].starts_with("221 "));
    assert_eq!(ctx.stats.snapshot().total_logins, 1);
}

#[tokio::test]
async fn pass_before_user_is_503() {
    let ctx = test_context();
    let mut session = test_session_with(MockFsState::default());
    let (_, output) = run_session(&ctx, &mut session, "PASS secret\r\n").await;
    assert!(output.starts_with("503 "));
}

#[tokio::test]
async fn third_failed_login_disconnects_with_421() {
    let ctx = test_context();
    let mut session = test_session_with(MockFsState::default());

    let script = "USER alice\r\nPASS wrong\r\nUSER alice\r\nPASS wrong\r\nUSER alice\r\nPASS wrong\r\nNOOP\r\n";
    let (end, output) = run_session(&ctx, &mut session, script).await;

    assert_eq!(end, SessionEnd::ForcedClose);
    let lines = reply_lines(&output);
    assert_eq!(lines.iter().filter(|l| l.starts_with("530 ")).count(), 2);
    assert!(lines.last().unwrap().starts_with("421 "));
    assert_eq!(ctx.stats.snapshot().total_logins, 0);
}

#[tokio::test]
async fn rename_flow_consumes_the_marker() {
    let state = MockFsState::default();
    state.add("/old.txt", MockEntry::file());
    let ctx = test_context();
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "RNFR old.txt\r\nRNTO new.txt\r\n").await;

    let lines = reply_lines(&output);
    assert!(lines[0].starts_with("350 "));
    assert!(lines[1].starts_with("250 "));
    assert!(!state.contains("/old.txt"));
    assert!(state.contains("/new.txt"));
    assert_eq!(ctx.stats.snapshot().files_renamed, 1);
    assert_eq!(session.rename_from, None);
}

#[tokio::test]
async fn intervening_command_clears_the_rename_marker() {
    let state = MockFsState::default();
    state.add("/old.txt", MockEntry::file());
    let ctx = test_context();
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(
        &ctx,
        &mut session,
        "RNFR old.txt\r\nNOOP\r\nRNTO new.txt\r\n",
    )
    .await;

    let lines = reply_lines(&output);
    assert!(lines[2].starts_with("503 "));
    assert!(state.contains("/old.txt"));
}

#[tokio::test]
async fn rnto_without_rnfr_is_503() {
    let ctx = test_context();
    let mut session = logged_in(MockFsState::default());
    let (_, output) = run_session(&ctx, &mut session, "RNTO new.txt\r\n").await;
    assert!(output.starts_with("503 "));
}

#[tokio::test]
async fn rest_marker_is_cleared_by_an_unrelated_command() {
    let ctx = test_context();
    let mut session = logged_in(MockFsState::default());
    let (_, output) = run_session(&ctx, &mut session, "REST 100\r\nNOOP\r\n").await;
    assert!(output.starts_with("350 Restarting at 100."));
    assert_eq!(session.restart_offset, 0);
}

#[tokio::test]
async fn mkd_and_cwd_against_the_mock_tree() {
    let state = MockFsState::default();
    let ctx = test_context();
    let mut session = logged_in(state.clone());

    let (_, output) = run_session(&ctx, &mut session, "MKD pub\r\nCWD pub\r\nPWD\r\nCDUP\r\n").await;

    let lines = reply_lines(&output);
    assert_eq!(lines[0], "257 \"/pub\" directory created.");
    assert!(lines[1].starts_with("250 "));
    assert_eq!(lines[2], "257 \"/pub\" is the current directory.");
    assert!(lines[3].starts_with("250 "));
    assert_eq!(ctx.stats.snapshot().dirs_created, 1);
}

#[tokio::test]
async fn size_reports_only_regular_files() {
    let state = MockFsState::default();
    state.add("/big.bin", {
        let mut e = MockEntry::file();
        e.size = 4096;
        e
    });
    state.add("/pub", MockEntry::dir());
    let ctx = test_context();
    let mut session = logged_in(state);

    let (_, output) = run_session(&ctx, &mut session, "SIZE big.bin\r\nSIZE pub\r\n").await;

    let lines = reply_lines(&output);
    assert_eq!(lines[0], "213 4096");
    assert!(lines[1].starts_with("550 "));
}

// ---------------------------------------------------------------------
// Transfers against the local-disk backend and real loopback sockets

fn temp_root(tag: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let dir = std::env::temp_dir().join(format!(
        "ferroftpd-cmd-{}-{}-{}",
        tag,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn native_session(root: &PathBuf) -> Session {
    let factory = NativeFileSystemFactory::new(root).unwrap();
    let mut session = Session::new(
        1,
        "127.0.0.1:40000".parse().unwrap(),
        "127.0.0.1:2121".parse().unwrap(),
        factory.create_view("alice").unwrap(),
        Duration::from_secs(5),
    );
    session.username = Some(String::from("alice"));
    session
}

fn port_argument(port: u16) -> String {
    format!("127,0,0,1,{},{}", port / 256, port % 256)
}

#[tokio::test]
async fn retr_streams_the_file_in_active_mode() {
    let root = temp_root("retr");
    std::fs::write(root.join("report.txt"), b"quarterly numbers").unwrap();
    let ctx = test_context();
    let mut session = native_session(&root);

    // the test plays the client's data endpoint
    let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_port = data_listener.local_addr().unwrap().port();
    let receiver = tokio::spawn(async move {
        let (mut stream, _) = data_listener.accept().await.unwrap();
        let mut body = Vec::new();
        stream.read_to_end(&mut body).await.unwrap();
        body
    });

    let script = format!("PORT {}\r\nRETR report.txt\r\n", port_argument(data_port));
    let (_, output) = run_session(&ctx, &mut session, &script).await;

    let lines = reply_lines(&output);
    assert!(lines[0].starts_with("200 "));
    assert!(lines[1].starts_with("150 "));
    assert!(lines[2].starts_with("226 "));
    assert_eq!(receiver.await.unwrap(), b"quarterly numbers");
    let totals = ctx.stats.snapshot();
    assert_eq!(totals.files_downloaded, 1);
    assert_eq!(totals.bytes_downloaded, 17);

    std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn rest_offset_applies_to_the_next_retr() {
    let root = temp_root("rest");
    std::fs::write(root.join("log.txt"), b"0123456789").unwrap();
    let ctx = test_context();
    let mut session = native_session(&root);

    let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_port = data_listener.local_addr().unwrap().port();
    let receiver = tokio::spawn(async move {
        let (mut stream, _) = data_listener.accept().await.unwrap();
        let mut body = Vec::new();
        stream.read_to_end(&mut body).await.unwrap();
        body
    });

    let script = format!(
        "PORT {}\r\nREST 6\r\nRETR log.txt\r\n",
        port_argument(data_port)
    );
    let (_, output) = run_session(&ctx, &mut session, &script).await;

    assert!(output.contains("350 Restarting at 6."));
    assert_eq!(receiver.await.unwrap(), b"6789");
    assert_eq!(session.restart_offset, 0);

    std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn stor_receives_the_upload_in_passive_mode() {
    let root = temp_root("stor");
    let ctx = test_context();
    let mut session = native_session(&root);

    let (_, output) = run_session(&ctx, &mut session, "PASV\r\n").await;
    let line = reply_lines(&output)[0].to_string();
    assert!(line.starts_with("227 "));
    let fields: Vec<u16> = line
        .trim_end_matches(").")
        .rsplit_once('(')
        .unwrap()
        .1
        .split(',')
        .map(|f| f.parse().unwrap())
        .collect();
    let port = fields[4] * 256 + fields[5];

    let uploader = tokio::spawn(async move {
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        stream.write_all(b"fresh upload").await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let (_, output) = run_session(&ctx, &mut session, "STOR incoming.txt\r\n").await;
    let lines = reply_lines(&output);
    assert!(lines[0].starts_with("150 "));
    assert!(lines[1].starts_with("226 "));
    uploader.await.unwrap();

    assert_eq!(
        std::fs::read(root.join("incoming.txt")).unwrap(),
        b"fresh upload"
    );
    assert_eq!(ctx.stats.snapshot().files_uploaded, 1);

    std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn passive_timeout_fails_the_transfer_but_not_the_session() {
    let root = temp_root("timeout");
    std::fs::write(root.join("slow.txt"), b"x").unwrap();
    let ctx = test_context();
    let mut session = native_session(&root);
    // nobody will connect to the passive listener
    session.data_channel = crate::core_network::data::DataChannel::new(Duration::from_millis(50));

    let (_, output) = run_session(&ctx, &mut session, "PASV\r\nRETR slow.txt\r\nNOOP\r\n").await;

    let lines = reply_lines(&output);
    assert!(lines[0].starts_with("227 "));
    assert!(lines[1].starts_with("150 "));
    assert!(lines[2].starts_with("425 "));
    // the dispatch loop is still alive after the failed transfer
    assert!(lines[3].starts_with("200 "));

    std::fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn list_sends_a_long_listing_over_the_data_channel() {
    let root = temp_root("list");
    std::fs::write(root.join("a.txt"), b"aaa").unwrap();
    std::fs::create_dir(root.join("pub")).unwrap();
    let ctx = test_context();
    let mut session = native_session(&root);

    let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let data_port = data_listener.local_addr().unwrap().port();
    let receiver = tokio::spawn(async move {
        let (mut stream, _) = data_listener.accept().await.unwrap();
        let mut body = String::new();
        stream.read_to_string(&mut body).await.unwrap();
        body
    });

    let script = format!("PORT {}\r\nLIST\r\n", port_argument(data_port));
    let (_, output) = run_session(&ctx, &mut session, &script).await;
    assert!(output.contains("226 "));

    let listing = receiver.await.unwrap();
    assert!(listing.contains("a.txt"));
    assert!(listing.lines().any(|l| l.starts_with('d') && l.ends_with("pub")));

    std::fs::remove_dir_all(&root).unwrap();
}
