use std::fs;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn renderform() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("renderform"));
    cmd.env_remove("RENDERFORM_API_KEY")
        .env_remove("RENDERFORM_CONFIG_FILE")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn renders_directory_end_to_end() {
    let server = MockServer::start();
    let render = server.mock(|when, then| {
        when.method("POST")
            .path("/api/v2/render")
            .header("x-api-key", "cli-key")
            .json_body_includes(r#"{"template":"tpl","data":{"title":"Hi"}}"#);
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(
                r#"{{"href":"{}"}}"#,
                server.url("/assets/out.png")
            ));
    });
    let asset = server.mock(|when, then| {
        when.method("GET").path("/assets/out.png");
        then.status(200).body("image");
    });

    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("card.json"),
        r#"{"renderform": true, "data": {"title": "Hi"}}"#,
    )
    .expect("write descriptor");

    renderform()
        .env("RENDERFORM_API_KEY", "cli-key")
        .arg("--template")
        .arg("tpl")
        .arg("--endpoint")
        .arg(server.url("/api/v2/render"))
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Render: "))
        .stdout(contains("card.png"))
        .stdout(contains("Finished!"));

    assert_eq!(
        fs::read(dir.path().join("card.png")).expect("artifact"),
        b"image"
    );
    render.assert();
    asset.assert();

    renderform()
        .arg("--api-key")
        .arg("cli-key")
        .arg("--template")
        .arg("tpl")
        .arg("--endpoint")
        .arg(server.url("/api/v2/render"))
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Skipping: card.png already exists"))
        .stdout(contains("--overwrite"));

    render.assert_calls(1);
}

#[test]
fn render_failure_exits_non_zero_with_payload() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/v2/render");
        then.status(402)
            .header("content-type", "application/json")
            .body(r#"{"msg":"quota exceeded"}"#);
    });

    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("card.json"),
        r#"{"renderform": true, "data": {}}"#,
    )
    .expect("write descriptor");

    renderform()
        .arg("--api-key")
        .arg("cli-key")
        .arg("--template")
        .arg("tpl")
        .arg("--endpoint")
        .arg(server.url("/api/v2/render"))
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("402"))
        .stderr(contains("quota exceeded"))
        .stdout(contains("Finished!").not());
}

#[test]
fn missing_directory_is_not_an_error() {
    renderform()
        .arg("--api-key")
        .arg("cli-key")
        .arg("--template")
        .arg("tpl")
        .assert()
        .success()
        .stdout(contains("No directory provided"));
}

#[test]
fn missing_api_key_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    renderform()
        .arg("--template")
        .arg("tpl")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("render.api_key"));
}
