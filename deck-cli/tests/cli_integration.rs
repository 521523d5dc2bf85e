//! CLI Integration Tests
//!
//! Runs the headless pipeline end to end:
//! - Polling a mock backend until the project completes
//! - Measuring and scaling every slide without a display
//! - Exporting to a file and reading the result back

use std::time::Duration;

use deck_cli::{HeadlessHost, HostConfig, PollConfig, Project, ProjectClient, ProjectStatus, RetryConfig};
use deck_core::{ConvergencePolicy, Readiness};
use deck_export::{DeckExporter, ExportFormat};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn fast_host() -> HeadlessHost {
    HeadlessHost::new(HostConfig {
        settle_delay: Duration::ZERO,
        policy: ConvergencePolicy {
            frame_interval: Duration::from_millis(1),
            ..ConvergencePolicy::default().with_max_attempts(5)
        },
        safety_timeout: Duration::from_secs(2),
        ..HostConfig::default()
    })
}

fn slides_json() -> Value {
    json!([
        { "slideNumber": 1, "type": "TitleSlide", "title": "Launch Plan" },
        {
            "slideNumber": 2,
            "type": "ContentSlide",
            "title": "Milestones",
            "content": "- **Alpha**: internal\n- **Beta**: partners\n- **GA**: everyone",
            "imageUrl": "https://img.example/road.png"
        },
        { "slideNumber": 3, "type": "Q&A", "title": "Questions?" }
    ])
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_poll_measure_and_export() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/themes/project/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 77, "status": "image creation", "slides": slides_json()
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/themes/project/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 77,
            "status": "completed",
            "slides": slides_json(),
            "theme": { "background_color": "#0f172a", "primary_color": "white" }
        })))
        .mount(&server)
        .await;

    let client = ProjectClient::with_retry_config(&server.uri(), RetryConfig::new(2, 1, 5, 2.0)).unwrap();
    let poll = PollConfig {
        interval: Duration::from_millis(5),
        max_polls: Some(5),
    };
    let project = client.poll_until_terminal("77", &poll).await.unwrap();
    assert_eq!(project.status, ProjectStatus::Completed);
    assert_eq!(project.slides.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("launch.json");
    let exporter = DeckExporter::with_defaults();
    let written = fast_host()
        .export(
            &project.slides,
            &project.theme_or_default(),
            &exporter,
            ExportFormat::Json,
            &output,
        )
        .await
        .unwrap();

    let deck: Value = serde_json::from_slice(&std::fs::read(written).unwrap()).unwrap();
    assert_eq!(deck["title"], "Launch Plan");
    let pages = deck["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0]["background"], "0F172A");
    let kinds: Vec<&str> = pages[1]["primitives"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"image"));
    assert!(kinds.contains(&"text"));
}

// ============================================================================
// Saved projects
// ============================================================================

#[tokio::test]
async fn test_saved_slide_array_exports_pptx() {
    let project = Project::from_json(&slides_json().to_string()).unwrap();
    let report = fast_host()
        .measure(&project.slides, DeckExporter::with_defaults().config().font_sizes)
        .await;
    assert_eq!(report.readiness, Readiness::Converged);
    assert!(report.layouts.iter().all(Option::is_some));

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("saved.pptx");
    let exporter = DeckExporter::with_defaults();
    fast_host()
        .export(
            &project.slides,
            &project.theme_or_default(),
            &exporter,
            ExportFormat::Pptx,
            &output,
        )
        .await
        .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    // zip local file header
    assert_eq!(&bytes[..4], b"PK\x03\x04");
}
