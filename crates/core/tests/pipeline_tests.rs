//! Network-free runs of the download and mix stages.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::Mutex,
    time::Duration,
};

use image::{Rgba, RgbaImage};
use serde_json::{Value, json};
use sprite_merger::{Icon, SpriteAtlas};
use stylemix_core::{
    Auth, Config, ConfigError, Fetch, FetchError, MixError, Pipeline, RetryPolicy, Settings, State,
    StyleDownloader, StyleMixer,
};
use tempfile::TempDir;

const FALLBACK: &str = "https://fallback.test/font/{fontstack}/{range}.pbf";

/// In-memory URL table. Exact URLs win over prefixes; anything else is a 404.
#[derive(Default)]
struct FakeFetcher {
    exact: HashMap<String, Vec<u8>>,
    prefixes: Vec<(String, Vec<u8>)>,
    calls: Mutex<Vec<(String, Option<Auth>)>>,
}

impl FakeFetcher {
    fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.exact.insert(url.to_owned(), body.into());
        self
    }

    fn with_json(self, url: &str, body: Value) -> Self {
        self.with(url, body.to_string())
    }

    fn with_prefix(mut self, prefix: &str, body: impl Into<Vec<u8>>) -> Self {
        self.prefixes.push((prefix.to_owned(), body.into()));
        self
    }

    fn with_sprite(self, base: &str, atlas: &SpriteAtlas) -> Self {
        self.with(&format!("{base}.png"), atlas.encode_png().unwrap())
            .with(&format!("{base}.json"), atlas.metadata_json().unwrap())
    }

    fn calls(&self) -> Vec<(String, Option<Auth>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetch for FakeFetcher {
    fn fetch(&self, url: &str, auth: Option<&Auth>) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push((url.to_owned(), auth.cloned()));
        if let Some(body) = self.exact.get(url) {
            return Ok(body.clone());
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| FetchError::Status { url: url.to_owned(), status: 404 })
    }
}

fn atlas(size: u32, shade: u8, icon: &str) -> SpriteAtlas {
    SpriteAtlas::new(
        RgbaImage::from_pixel(size, size, Rgba([shade, 0, 0, 255])),
        [(icon.to_owned(), Icon::new(0, 0, size, size))].into_iter().collect(),
    )
}

fn town_style(sprite: &str) -> Value {
    json!({
        "version": 8,
        "id": "town",
        "name": "Town",
        "sprite": sprite,
        "glyphs": "https://tiles.test/fonts/{fontstack}/{range}.pbf",
        "sources": { "streets": { "type": "vector", "url": "https://tiles.test/streets" } },
        "layers": [{
            "id": "labels",
            "type": "symbol",
            "source": "streets",
            "layout": { "text-font": ["Noto Sans Regular"] }
        }]
    })
}

fn settings(dir: &Path) -> Settings {
    Settings {
        glyph_concurrency: 2,
        fallback_glyphs_url: FALLBACK.to_owned(),
        ..Settings::default()
    }
    .work_dir(dir)
    .retry(RetryPolicy { max_attempts: 2, base_delay: Duration::ZERO, max_delay: Duration::ZERO })
}

fn single_source(mix_id: &str, url: &str) -> Config {
    Config::from_yaml(&format!("styles:\n  {mix_id}:\n    sources: [\"{url}\"]\n")).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_full_cycle_with_colliding_sources() {
    let tmp = TempDir::new().unwrap();
    let config = Config::from_yaml(
        r#"
styles:
  towns:
    name: Two Towns
    sources:
      - https://styles.test/a.json
      - https://styles.test/b.json
"#,
    )
    .unwrap();
    let a = atlas(8, 10, "pin");
    let b = atlas(4, 20, "flag");
    let fetcher = FakeFetcher::default()
        .with_json("https://styles.test/a.json", town_style("https://sprites.test/a"))
        .with_json("https://styles.test/b.json", town_style("https://sprites.test/b"))
        .with_sprite("https://sprites.test/a", &a)
        .with_sprite("https://sprites.test/a@2x", &a.scaled(2))
        .with_sprite("https://sprites.test/b", &b)
        .with_prefix("https://tiles.test/fonts/", b"pbf".to_vec());

    let pipeline = Pipeline::new(config, settings(tmp.path()), fetcher);
    let report = pipeline.run_cycle().unwrap();

    assert_eq!(report.mixed.succeeded, 1);
    assert_eq!(pipeline.status().get().state, State::Ready);

    let mixed = read_json(&tmp.path().join("mixed_styles/towns.json"));
    assert_eq!(mixed["name"], "Two Towns");
    assert_eq!(mixed["sprite"], "/sprite/towns_sprite");
    assert_eq!(mixed["glyphs"], "/fonts/{fontstack}/{range}.pbf");
    assert_eq!(mixed["layers"][0]["id"], "town_labels");
    assert_eq!(mixed["layers"][1]["id"], "town_1_labels");
    assert_eq!(mixed["layers"][1]["layout"]["text-font"], json!(["town_1/Noto Sans Regular"]));

    // glyphs land where the rewritten text-font points
    for prefix in ["town", "town_1"] {
        let dir = tmp.path().join("fonts").join(prefix).join("Noto Sans Regular");
        assert_eq!(fs::read(dir.join("0-255.pbf")).unwrap(), b"pbf");
        assert!(dir.join("65280-65535.pbf").is_file());
    }

    // regular atlases stacked, missing @2x for b synthesized
    let sprite = read_json(&tmp.path().join("sprite/towns_sprite.json"));
    assert_eq!(sprite["flag"]["y"], 8);
    let high_dpi = read_json(&tmp.path().join("sprite/towns_sprite@2x.json"));
    assert_eq!(high_dpi["flag"]["y"], 16);
    assert_eq!(high_dpi["flag"]["width"], 8);
    assert!(tmp.path().join("raw_styles/towns_2.json").is_file());
}

#[test]
fn test_basic_auth_is_forwarded() {
    let tmp = TempDir::new().unwrap();
    let config = Config::from_yaml(
        r#"
styles:
  secure:
    sources:
      - url: https://secure.test/style.json
        auth: { username: user, password: pass }
      - https://public.test/style.json
"#,
    )
    .unwrap();
    let fetcher = FakeFetcher::default()
        .with_json("https://secure.test/style.json", json!({ "id": "secure", "layers": [] }))
        .with_json("https://public.test/style.json", json!({ "id": "public", "layers": [] }));
    let settings = settings(tmp.path());

    StyleDownloader::new(&config, &settings, &fetcher).download_all().unwrap();

    let calls = fetcher.calls();
    assert_eq!(calls[0], ("https://secure.test/style.json".to_owned(), Some(Auth::new("user", "pass"))));
    assert_eq!(calls[1], ("https://public.test/style.json".to_owned(), None));
}

#[test]
fn test_failing_mix_does_not_stop_others() {
    let tmp = TempDir::new().unwrap();
    let config = Config::from_yaml(
        r#"
styles:
  broken:
    sources: ["https://down.test/style.json"]
  fine:
    sources: ["https://up.test/style.json"]
"#,
    )
    .unwrap();
    let fetcher = FakeFetcher::default()
        .with_json("https://up.test/style.json", json!({ "id": "up", "layers": [{ "id": "x" }] }));

    let pipeline = Pipeline::new(config, settings(tmp.path()), fetcher);
    let report = pipeline.run_cycle().unwrap();

    assert_eq!((report.downloaded.succeeded, report.downloaded.failed), (1, 1));
    assert_eq!((report.mixed.succeeded, report.mixed.failed), (1, 1));
    assert!(tmp.path().join("mixed_styles/fine.json").is_file());
    assert!(!tmp.path().join("mixed_styles/broken.json").exists());
}

#[test]
fn test_retry_gives_up_and_reports_error() {
    let tmp = TempDir::new().unwrap();
    let config = single_source("only", "https://down.test/style.json");

    let pipeline = Pipeline::new(config, settings(tmp.path()), FakeFetcher::default());
    let status = pipeline.status();

    assert!(pipeline.run_with_retry().is_err());
    let last = status.get();
    assert_eq!(last.state, State::Error);
    assert_eq!(last.progress, 0);
    assert!(last.message.starts_with("Error: "));
}

#[test]
fn test_zero_source_mix_writes_base_style() {
    let tmp = TempDir::new().unwrap();
    let config = Config::from_yaml("styles:\n  empty:\n    sources: []\n").unwrap();

    let pipeline = Pipeline::new(config, settings(tmp.path()), FakeFetcher::default());
    pipeline.run_cycle().unwrap();

    let mixed = read_json(&tmp.path().join("mixed_styles/empty.json"));
    assert_eq!(mixed["name"], "Mixed Style: empty");
    assert_eq!(mixed["sprite"], Value::Null);
    assert_eq!(mixed["sources"], json!({}));
    assert_eq!(mixed["layers"], json!([]));
}

#[test]
fn test_glyphs_fall_back_to_shared_source() {
    let tmp = TempDir::new().unwrap();
    let config = single_source("mix", "https://styles.test/a.json");
    let fetcher = FakeFetcher::default()
        .with_json("https://styles.test/a.json", town_style("https://sprites.test/none"))
        .with_prefix("https://fallback.test/font/Noto%20Sans%20Regular/", b"fallback".to_vec());
    let settings = settings(tmp.path());

    let summary = StyleDownloader::new(&config, &settings, &fetcher).download_mix("mix").unwrap();

    assert_eq!(summary.font_stacks, 1);
    assert_eq!(summary.sprite_files, 0);
    let range = tmp.path().join("fonts/town/Noto Sans Regular/256-511.pbf");
    assert_eq!(fs::read(range).unwrap(), b"fallback");
}

#[test]
fn test_unknown_mix_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    let config = Config::default();
    let settings = settings(tmp.path());
    let fetcher = FakeFetcher::default();

    let download = StyleDownloader::new(&config, &settings, &fetcher).download_mix("ghost");
    assert!(matches!(download, Err(MixError::Config(ConfigError::UnknownMix(_)))));

    let mix = StyleMixer::new(&config, &settings).mix("ghost");
    assert!(matches!(mix, Err(MixError::Config(ConfigError::UnknownMix(_)))));
}

#[test]
fn test_single_mix_reuses_downloads() {
    let tmp = TempDir::new().unwrap();
    let config = single_source("mix", "https://styles.test/a.json");
    let fetcher = FakeFetcher::default()
        .with_json("https://styles.test/a.json", json!({ "id": "solo", "layers": [{ "id": "bg" }] }));
    let settings = settings(tmp.path());

    StyleDownloader::new(&config, &settings, &fetcher).download_mix("mix").unwrap();
    let summary = StyleMixer::new(&config, &settings).mix("mix").unwrap();

    assert_eq!(summary.layers, 1);
    assert!(!summary.sprite);
    let mixed = read_json(&tmp.path().join("mixed_styles/mix.json"));
    assert_eq!(mixed["layers"][0]["id"], "solo_bg");
}

#[test]
fn test_single_mix_replaces_previous_outputs() {
    let tmp = TempDir::new().unwrap();
    let config = single_source("m", "https://styles.test/a.json");
    let fetcher = FakeFetcher::default()
        .with_json("https://styles.test/a.json", town_style("https://sprites.test/a"))
        .with_sprite("https://sprites.test/a", &atlas(4, 10, "pin"))
        .with_prefix("https://tiles.test/fonts/", b"pbf".to_vec());
    let settings = settings(tmp.path());
    StyleDownloader::new(&config, &settings, &fetcher).download_mix("m").unwrap();
    let mixer = StyleMixer::new(&config, &settings);

    assert!(mixer.mix("m").unwrap().sprite);
    let sprite_png = tmp.path().join("sprite/m_sprite.png");
    assert!(sprite_png.is_file());

    fs::remove_dir_all(tmp.path().join("sprites/m_1")).unwrap();
    let second = mixer.mix("m").unwrap();

    assert!(!second.sprite);
    assert!(!sprite_png.exists());
    assert!(!tmp.path().join("sprite/m_sprite@2x.png").exists());
    assert_eq!(read_json(&tmp.path().join("mixed_styles/m.json"))["sprite"], Value::Null);
}

#[test]
fn test_font_names_cannot_leave_fonts_dir() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let config = single_source("mix", "https://styles.test/a.json");
    let style = json!({
        "id": "evil",
        "glyphs": "https://tiles.test/fonts/{fontstack}/{range}.pbf",
        "layers": [
            { "id": "a", "layout": { "text-font": ["../../../escaped"] } },
            { "id": "b", "layout": { "text-font": ["Noto Sans Regular"] } }
        ]
    });
    let fetcher = FakeFetcher::default()
        .with_json("https://styles.test/a.json", style)
        .with_prefix("https://tiles.test/fonts/", b"pbf".to_vec());
    let settings = settings(&work);

    let summary = StyleDownloader::new(&config, &settings, &fetcher).download_mix("mix").unwrap();

    assert_eq!(summary.font_stacks, 1);
    assert!(work.join("fonts/evil/Noto Sans Regular/0-255.pbf").is_file());
    assert!(!tmp.path().join("escaped").exists());
    assert!(!work.join("escaped").exists());
}
