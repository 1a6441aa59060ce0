//! Generated sound effects, fetched once per process and cached.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use bytes::Bytes;
use log::{debug, info, warn};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Serialize;

use crate::error::SfxError;
use crate::quiz::sound::CueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Whoosh,
    Ding,
    Reveal,
    Ambient,
}

impl Clip {
    pub fn for_cue(kind: CueKind) -> Self {
        match kind {
            CueKind::Start | CueKind::Whoosh => Clip::Whoosh,
            CueKind::Ding => Clip::Ding,
            CueKind::Reveal => Clip::Reveal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Clip::Whoosh => "whoosh",
            Clip::Ding => "ding",
            Clip::Reveal => "reveal",
            Clip::Ambient => "ambient",
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            Clip::Whoosh => "magical mystical whoosh transition sound effect, ethereal sweep, short 1 second",
            Clip::Ding => "soft magical chime ding, gentle bell notification, sparkle sound, very short",
            Clip::Reveal => "magical reveal fanfare, triumphant discovery sound, golden sparkles and chimes, mystical unveiling, 3 seconds",
            Clip::Ambient => "mysterious ambient background music, ethereal dreamy atmosphere, soft golden magical tones, looping",
        }
    }

    /// Requested length in seconds.
    pub fn duration(self) -> u32 {
        match self {
            Clip::Whoosh | Clip::Ding => 2,
            Clip::Reveal => 3,
            Clip::Ambient => 15,
        }
    }

    pub fn cache_key(self) -> String {
        format!("{}-{}", self.name(), self.duration())
    }
}

#[derive(Serialize)]
struct SfxRequest<'a> {
    prompt: &'a str,
    duration: u32,
}

pub struct SfxLibrary {
    client: Client,
    endpoint: String,
    api_key: String,
    cache: Mutex<HashMap<String, Bytes>>,
    generating: Mutex<HashSet<String>>,
}

impl SfxLibrary {
    pub fn new(endpoint: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint,
            api_key,
            cache: Mutex::new(HashMap::new()),
            generating: Mutex::new(HashSet::new()),
        }
    }

    /// The clip's audio, generated on first use. A clip that is still being
    /// generated for someone else is reported as `InFlight`, not awaited.
    pub async fn clip(&self, clip: Clip) -> Result<Bytes, SfxError> {
        let key = clip.cache_key();
        if let Some(audio) = self.cache.lock().get(&key) {
            return Ok(audio.clone());
        }
        if !self.generating.lock().insert(key.clone()) {
            return Err(SfxError::InFlight(key));
        }

        let generated = self.generate(clip).await;
        self.generating.lock().remove(&key);

        let audio = generated?;
        info!("generated {} ({} bytes)", key, audio.len());
        self.cache.lock().insert(key, audio.clone());
        Ok(audio)
    }

    /// Warms the cache with the short effects so the first cues are instant.
    pub async fn preload(&self) {
        for clip in [Clip::Whoosh, Clip::Ding, Clip::Reveal] {
            if let Err(err) = self.clip(clip).await {
                warn!("could not preload {}: {}", clip.name(), err);
            }
        }
    }

    async fn generate(&self, clip: Clip) -> Result<Bytes, SfxError> {
        debug!("requesting {} from the sound generator", clip.name());
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&SfxRequest {
                prompt: clip.prompt(),
                duration: clip.duration(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SfxError::Status(response.status()));
        }
        Ok(response.bytes().await?)
    }

    #[cfg(test)]
    fn insert_cached(&self, clip: Clip, audio: &'static [u8]) {
        self.cache.lock().insert(clip.cache_key(), Bytes::from_static(audio));
    }
}
