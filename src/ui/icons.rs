pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const GRAPH: &str = "🕸️";
    pub const BOOK: &str = "📚";
    pub const SAVE: &str = "💾";
    pub const LOAD: &str = "📂";
}
