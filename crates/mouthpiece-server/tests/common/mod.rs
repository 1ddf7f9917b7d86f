#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use mouthpiece_pipeline::canned::{INTRO_CLIPS, MISSING_KEYS_CLIPS};
use mouthpiece_server::config::Config;
use mouthpiece_server::{app, AppState};
use mouthpiece_voice::SynthesisConfig;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const OPENAI_KEY: &str = "sk-test";
pub const ELEVENLABS_KEY: &str = "el-test";
pub const VOICE_ID: &str = "voice-1";

pub const CUES_JSON: &str = r#"{"metadata":{"duration":0.5},"mouthCues":[{"start":0.0,"end":0.12,"value":"X"},{"start":0.12,"end":0.3,"value":"D"},{"start":0.3,"end":0.5,"value":"X"}]}"#;

#[derive(Clone, Default)]
pub struct OpenAiMock {
    pub reply: Arc<Mutex<String>>,
    pub last_request: Arc<Mutex<Option<Value>>>,
}

async fn completions(
    State(mock): State<OpenAiMock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let expected = format!("Bearer {}", OPENAI_KEY);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    *mock.last_request.lock().unwrap() = Some(body);
    let content = mock.reply.lock().unwrap().clone();
    Ok(Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })))
}

#[derive(Clone, Default)]
pub struct ElevenLabsMock {
    pub calls: Arc<AtomicUsize>,
}

async fn text_to_speech(
    State(mock): State<ElevenLabsMock>,
    UrlPath(voice_id): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Vec<u8>, StatusCode> {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("xi-api-key").and_then(|v| v.to_str().ok()) != Some(ELEVENLABS_KEY)
        || voice_id != VOICE_ID
    {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let text = body["text"].as_str().unwrap_or_default();
    Ok(format!("mp3:{}", text).into_bytes())
}

async fn voices() -> Json<Value> {
    Json(json!({ "voices": [{ "voice_id": VOICE_ID, "name": "Rachel" }] }))
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Copies `-i <src>` to the destination; answers `-version`.
fn fake_ffmpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "ffmpeg",
        r#"if [ "$1" = "-version" ]; then echo "ffmpeg version fake"; exit 0; fi
cp "$3" "$4""#,
    )
}

/// Writes `CUES_JSON` to the `-o` path; fails when the audio mentions "mumble";
/// deletes the compressed audio next to it when the audio mentions "vanish".
fn fake_rhubarb(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "rhubarb",
        &format!(
            r#"if grep -q mumble "$5"; then echo "recognition failed" >&2; exit 1; fi
if grep -q vanish "$5"; then rm -f "${{5%.wav}}.mp3"; fi
printf '%s' '{}' > "$4""#,
            CUES_JSON
        ),
    )
}

fn render_canned(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    for clip in INTRO_CLIPS.iter().chain(MISSING_KEYS_CLIPS) {
        std::fs::write(dir.join(format!("{}.wav", clip.stem)), b"RIFF-canned").unwrap();
        std::fs::write(dir.join(format!("{}.json", clip.stem)), CUES_JSON).unwrap();
    }
}

pub struct TestEnv {
    _temp_dir: tempfile::TempDir,
    pub config: Config,
    pub openai: OpenAiMock,
    pub elevenlabs: ElevenLabsMock,
    pub artifacts_dir: PathBuf,
}

impl TestEnv {
    pub async fn new(reply: &str) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().to_path_buf();

        let openai = OpenAiMock::default();
        *openai.reply.lock().unwrap() = reply.to_string();
        let openai_addr = serve(
            Router::new()
                .route("/v1/chat/completions", post(completions))
                .with_state(openai.clone()),
        )
        .await;

        let elevenlabs = ElevenLabsMock::default();
        let elevenlabs_addr = serve(
            Router::new()
                .route("/v1/text-to-speech/{voice_id}", post(text_to_speech))
                .route("/v1/voices", get(voices))
                .with_state(elevenlabs.clone()),
        )
        .await;

        let tools = root.join("bin");
        std::fs::create_dir_all(&tools).unwrap();
        let canned_dir = root.join("canned");
        render_canned(&canned_dir);
        let artifacts_dir = root.join("artifacts");

        let mut config = Config::default();
        config.cors.allowed_origins = vec![];
        config.openai.api_key = OPENAI_KEY.to_string();
        config.openai.base_url = format!("http://{}", openai_addr);
        config.elevenlabs = SynthesisConfig::new(ELEVENLABS_KEY, VOICE_ID)
            .with_base_url(format!("http://{}", elevenlabs_addr));
        config.media.artifacts_dir = artifacts_dir.clone();
        config.media.canned_dir = canned_dir;
        config.media.ffmpeg_binary = fake_ffmpeg(&tools);
        config.media.rhubarb_binary = fake_rhubarb(&tools);

        Self {
            _temp_dir: temp_dir,
            config,
            openai,
            elevenlabs,
            artifacts_dir,
        }
    }

    pub async fn app(&self) -> Router {
        let state = AppState::from_config(&self.config);
        state.sequencer.pipeline().store().prepare().await.unwrap();
        app(state)
    }

    pub fn synthesis_calls(&self) -> usize {
        self.elevenlabs.calls.load(Ordering::SeqCst)
    }

    pub fn artifact_count(&self) -> usize {
        std::fs::read_dir(&self.artifacts_dir).unwrap().count()
    }
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}
