//! # Bridge Voice - speech-to-text for seeker vents
//!
//! Audio arrives at the gateway either as an upload or as a URL. Either way it becomes
//! an [`AudioClip`], which an [`SttBackend`] turns into a transcript.
//!
//! ```text
//!  upload / audio_url ──> AudioClip ──> SttBackend ──> transcript
//!                                        ├─ OpenRouterStt  (STT_API_KEY set)
//!                                        └─ PlaceholderStt (offline)
//! ```

pub mod error;
pub mod stt;

pub use error::{VoiceError, VoiceResult};
pub use stt::{create_best_stt, AudioClip, OpenRouterStt, PlaceholderStt, SttBackend};
