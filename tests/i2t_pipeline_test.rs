mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{item, prompts, resolver, StubBackend, StubRenderer};
use physics_critic::{I2tWorkflow, LogContext};

const HTML_RESPONSE: &str = "Sure:\n```html\n<canvas id=\"fig\"></canvas>\n```\n";

#[tokio::test]
async fn test_code_saved_and_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::with_image_response(HTML_RESPONSE));
    let renderer = Arc::new(StubRenderer::default());
    let workflow = I2tWorkflow::new(
        backend.clone(),
        prompts(),
        resolver(dir.path()),
        renderer.clone(),
        1,
        &LogContext::detached("test"),
    );

    let record = workflow.transcribe(&item(460, &["images/460_0.png"])).await.unwrap();
    assert_eq!(record.index, 460);
    assert_eq!(record.images.len(), 1);

    let outcome = &record.images[0];
    assert_eq!(outcome.image_id, "460_0");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("html_code/460_0.html")).unwrap(),
        "<canvas id=\"fig\"></canvas>"
    );
    let rendered = outcome.rendered_path.as_ref().unwrap();
    assert!(rendered.starts_with(dir.path().join("html_images/460")));
    assert!(outcome.skipped.is_none());

    let calls = backend.image_calls.lock().unwrap();
    assert_eq!(
        calls[0],
        vec![std::path::PathBuf::from("data/upscaled_images/460_0.png")]
    );
}

#[tokio::test]
async fn test_each_image_has_its_own_iteration_budget() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::with_image_response(HTML_RESPONSE));
    let renderer = Arc::new(StubRenderer {
        fail_ids: vec!["7_0".to_string()],
        ..Default::default()
    });
    let workflow = I2tWorkflow::new(
        backend.clone(),
        prompts(),
        resolver(dir.path()),
        renderer.clone(),
        2,
        &LogContext::detached("test"),
    );

    let record = workflow
        .transcribe(&item(7, &["images/7_0.png", "images/7_1.png"]))
        .await
        .unwrap();

    // 第一张图两次都渲染失败，第二张图第一次就成功
    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 3);
    assert!(record.images[0].rendered_path.is_none());
    assert!(record.images[0].skipped.as_deref().unwrap().contains("canvas never painted"));
    assert!(record.images[0].code_path.is_some());
    assert!(record.images[1].rendered_path.is_some());
}

#[tokio::test]
async fn test_response_without_code_block_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::with_image_response("I cannot draw this."));
    let renderer = Arc::new(StubRenderer::default());
    let workflow = I2tWorkflow::new(
        backend,
        prompts(),
        resolver(dir.path()),
        renderer.clone(),
        1,
        &LogContext::detached("test"),
    );

    let record = workflow.transcribe(&item(8, &["images/8_0.png"])).await.unwrap();
    assert!(record.images[0].code_path.is_none());
    assert!(record.images[0].skipped.is_some());
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
}
