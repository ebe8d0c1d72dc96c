use std::collections::BTreeMap;

use crate::device::GpuBackend;

use super::Labeled;

/// Pipeline stage a program is declared for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProgramStage {
    Vertex,
    Fragment,
    Compute,
}

impl ProgramStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }

    fn from_attribute(token: &str) -> Option<Self> {
        match token {
            "@vertex" => Some(Self::Vertex),
            "@fragment" => Some(Self::Fragment),
            "@compute" => Some(Self::Compute),
            _ => None,
        }
    }
}

/// One WGSL translation unit that can be compiled into a module.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub label: String,
    pub wgsl: String,
}

impl ProgramSource {
    pub fn new(label: impl Into<String>, wgsl: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            wgsl: wgsl.into(),
        }
    }

    /// Entry points declared in this source, in declaration order.
    pub fn entry_points(&self) -> Vec<(ProgramStage, String)> {
        scan_entry_points(&self.wgsl)
    }
}

/// Named sources a program library resolves program names against.
#[derive(Debug, Clone)]
pub struct ProgramCatalog {
    label: String,
    sources: Vec<ProgramSource>,
}

impl ProgramCatalog {
    pub fn new(label: impl Into<String>, sources: Vec<ProgramSource>) -> Self {
        Self {
            label: label.into(),
            sources,
        }
    }

    /// Programs shipped with the engine.
    pub fn builtin() -> Self {
        Self::new(
            "pointfield programs",
            vec![
                ProgramSource::new("points", include_str!("../shaders/points.wgsl")),
                ProgramSource::new("post", include_str!("../shaders/post.wgsl")),
                ProgramSource::new("blur", include_str!("../shaders/blur.wgsl")),
            ],
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sources(&self) -> &[ProgramSource] {
        &self.sources
    }

    /// Maps every declared program name to `(stage, source index)`.
    ///
    /// When two sources declare the same name the first one wins.
    pub(crate) fn index(&self) -> BTreeMap<String, (ProgramStage, usize)> {
        let mut index = BTreeMap::new();
        for (i, source) in self.sources.iter().enumerate() {
            for (stage, name) in source.entry_points() {
                if index.contains_key(&name) {
                    log::warn!(
                        "program `{name}` in `{}` shadowed by an earlier source",
                        source.label
                    );
                    continue;
                }
                index.insert(name, (stage, i));
            }
        }
        index
    }
}

/// Compiled programs, addressable by name.
pub struct ProgramLibrary<B: GpuBackend> {
    label: String,
    modules: Vec<Labeled<B::Module>>,
    programs: BTreeMap<String, (ProgramStage, usize)>,
}

impl<B: GpuBackend> std::fmt::Debug for ProgramLibrary<B>
where
    B::Module: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramLibrary")
            .field("label", &self.label)
            .field("modules", &self.modules)
            .field("programs", &self.programs)
            .finish()
    }
}

impl<B: GpuBackend> ProgramLibrary<B> {
    pub(crate) fn new(
        label: String,
        modules: Vec<Labeled<B::Module>>,
        programs: BTreeMap<String, (ProgramStage, usize)>,
    ) -> Self {
        Self {
            label,
            modules,
            programs,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Module and stage of the program called `name`.
    pub fn program(&self, name: &str) -> Option<(&B::Module, ProgramStage)> {
        let (stage, module) = *self.programs.get(name)?;
        Some((&*self.modules[module], stage))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

/// Finds `@vertex` / `@fragment` / `@compute` functions.
///
/// Line comments are skipped; block comments are not understood, so entry
/// points must not be commented out with `/* */`.
pub(crate) fn scan_entry_points(wgsl: &str) -> Vec<(ProgramStage, String)> {
    let mut found = Vec::new();
    let mut pending: Option<ProgramStage> = None;
    let mut expect_name = false;

    for line in wgsl.lines() {
        let code = line.split("//").next().unwrap_or_default();
        let tokens = code
            .split(|c: char| c.is_whitespace() || c == '(')
            .filter(|t| !t.is_empty());

        for token in tokens {
            if expect_name {
                if let Some(stage) = pending.take() {
                    found.push((stage, token.to_owned()));
                }
                expect_name = false;
            } else if let Some(stage) = ProgramStage::from_attribute(token) {
                pending = Some(stage);
            } else if token == "fn" {
                expect_name = true;
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_stage_attributes_across_lines() {
        let wgsl = "
            @compute @workgroup_size(64)
            fn step(@builtin(global_invocation_id) id: vec3<u32>) {}

            fn helper(x: f32) -> f32 { return x; }

            @vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(); }
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(); }
        ";
        assert_eq!(
            scan_entry_points(wgsl),
            vec![
                (ProgramStage::Compute, "step".to_owned()),
                (ProgramStage::Vertex, "vs_main".to_owned()),
                (ProgramStage::Fragment, "fs_main".to_owned()),
            ]
        );
    }

    #[test]
    fn commented_entry_points_are_ignored() {
        let wgsl = "// @vertex fn hidden() {}\nfn plain() {}";
        assert!(scan_entry_points(wgsl).is_empty());
    }

    #[test]
    fn builtin_catalog_declares_every_required_program() {
        let index = ProgramCatalog::builtin().index();
        for name in [
            "points_vertex",
            "points_fragment",
            "update_points",
            "fullscreen_vertex",
            "composite_fragment",
            "upscale_fragment",
            "blur_image",
        ] {
            assert!(index.contains_key(name), "missing {name}");
        }
        assert_eq!(index["update_points"].0, ProgramStage::Compute);
        assert_eq!(index["fullscreen_vertex"].0, ProgramStage::Vertex);
    }

    #[test]
    fn first_declaration_wins() {
        let catalog = ProgramCatalog::new(
            "dupes",
            vec![
                ProgramSource::new("a", "@vertex fn main() {}"),
                ProgramSource::new("b", "@fragment fn main() {}"),
            ],
        );
        assert_eq!(catalog.index()["main"], (ProgramStage::Vertex, 0));
    }
}
