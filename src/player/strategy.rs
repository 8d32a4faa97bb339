//! Strategy instances
//!
//! Each playback attempt binds exactly one [`StrategyInstance`]. Instances are
//! released before a replacement is created, so two never compete for the
//! same sink.

use tokio::sync::mpsc::UnboundedSender;

use super::events::PlayerEvent;
use crate::models::StrategyKind;

/// A running adaptive engine bound to one attempt
pub trait AdaptiveInstance: Send {
    /// Stop all network and worker activity. Must be idempotent.
    fn release(&mut self);
}

/// Creates adaptive engine instances
pub trait AdaptiveEngineFactory: Send + Sync {
    /// Whether adaptive playback is available at all on this platform
    fn is_supported(&self) -> bool {
        true
    }

    /// Start loading `url`. Every event the instance emits must carry `attempt`.
    fn create(
        &self,
        url: &str,
        attempt: u64,
        events: UnboundedSender<PlayerEvent>,
    ) -> Box<dyn AdaptiveInstance>;
}

/// How an adaptive attempt reaches the sink
pub enum AdaptiveBinding {
    /// Segments are produced by an adaptive engine and appended to the sink
    Engine(Box<dyn AdaptiveInstance>),
    /// The sink plays the manifest itself; playback starts on metadata
    SinkNative,
}

pub enum StrategyInstance {
    Native,
    Adaptive(AdaptiveBinding),
    Embedded { viewer_url: String },
}

impl StrategyInstance {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyInstance::Native => StrategyKind::Native,
            StrategyInstance::Adaptive(_) => StrategyKind::Adaptive,
            StrategyInstance::Embedded { .. } => StrategyKind::Embedded,
        }
    }

    pub fn is_adaptive_engine(&self) -> bool {
        matches!(self, StrategyInstance::Adaptive(AdaptiveBinding::Engine(_)))
    }

    pub fn is_sink_native_adaptive(&self) -> bool {
        matches!(self, StrategyInstance::Adaptive(AdaptiveBinding::SinkNative))
    }

    /// Stop background work owned by this instance
    pub fn release(self) {
        if let StrategyInstance::Adaptive(AdaptiveBinding::Engine(mut instance)) = self {
            instance.release();
        }
    }
}

impl std::fmt::Debug for StrategyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyInstance::Native => write!(f, "Native"),
            StrategyInstance::Adaptive(AdaptiveBinding::Engine(_)) => write!(f, "Adaptive(engine)"),
            StrategyInstance::Adaptive(AdaptiveBinding::SinkNative) => {
                write!(f, "Adaptive(sink-native)")
            }
            StrategyInstance::Embedded { viewer_url } => write!(f, "Embedded({viewer_url})"),
        }
    }
}
