//! Plugin descriptors.
//!
//! Plugins travel to the bridge as `{ "plugin": <identity>, "options": {...} }`.
//! The `plugin` field is the identity the merge tables match on.

use serde_json::{json, Value};

pub const HTML: &str = "HtmlWebpackPlugin";
pub const DEFINE: &str = "DefinePlugin";
pub const CLEAN: &str = "CleanWebpackPlugin";
pub const VUE_LOADER: &str = "VueLoaderPlugin";
pub const CSS_EXTRACT: &str = "MiniCssExtractPlugin";
pub const BUNDLE_ANALYZER: &str = "BundleAnalyzerPlugin";
pub const COMPRESSION: &str = "CompressionPlugin";
pub const TERSER: &str = "TerserPlugin";
pub const CSS_MINIMIZER: &str = "CssMinimizerPlugin";

/// Field holding a descriptor's identity.
pub const IDENTITY_FIELD: &str = "plugin";

pub fn descriptor(identity: &str, options: Value) -> Value {
    json!({ IDENTITY_FIELD: identity, "options": options })
}

/// Identity of a descriptor, if it has one.
pub fn identity(descriptor: &Value) -> Option<&str> {
    descriptor.get(IDENTITY_FIELD).and_then(Value::as_str)
}
