pub mod arguments;
pub mod classpath;
pub mod orchestrator;
pub mod session;

pub use arguments::{game_arguments, jvm_arguments, LaunchContext, GC_FLAGS};
pub use classpath::{build_classpath, extract_natives, join_classpath, ClasspathPlan};
pub use orchestrator::{recording_observer, LaunchDefaults, LaunchOrchestrator, LaunchState, StateObserver};
pub use session::{
    classify_exit, detect_crash_indicator, LaunchSession, OutputLine, OutputStream, SessionSnapshot,
    CRASH_INDICATORS,
};
