/// Name of the UV channel every lightmap is sampled and baked through.
pub const LIGHTMAP_UV_CHANNEL: &str = "lightmap";

/// Name given to the primary UV channel when a mesh has none.
pub const DEFAULT_UV_CHANNEL: &str = "UVMap";

/// Label of the atlas sampling node inserted into a material's graph.
pub const LIGHTMAP_NODE_LABEL: &str = "Lightmap";

/// Label of the multiply node created by the baked view.
pub const LIGHTMAP_MULTIPLY_LABEL: &str = "Lightmap Multiply";

/// Aspect ratio above which the longer atlas axis is doubled.
pub const ASPECT_DOUBLING_THRESHOLD: f32 = 1.5;

/// Largest atlas dimension an `AtlasTexture` accepts.
pub const MAX_SUPPORTED_RESOLUTION: u32 = 16384;

/// Largest density policy bound. Grouped and aspect doubling may take a
/// dimension to twice this, which must still fit an atlas.
pub const MAX_POLICY_RESOLUTION: u32 = MAX_SUPPORTED_RESOLUTION / 2;

/// Tolerance for packed UV coordinates slightly outside [0, 1].
pub const UV_EPSILON: f32 = 1e-4;
