//! Rust source emission for one configured stage.
//!
//! A stage is described as a [`MethodTemplate`]: its parameters (one per
//! input, typed by the artifact actually fed in), a struct literal of the
//! current validated settings, and the library call that performs the
//! transform. [`MethodTemplate::render`] formats that description; it
//! never looks at pixel data, so emitting twice gives the same text.
//!
//! Generated methods call the same public functions the runtime uses and
//! convert inputs with the same [`ToImage`](crate::artifact::ToImage) /
//! [`ToPoints`](crate::artifact::ToPoints) /
//! [`ToContours`](crate::artifact::ToContours) traits.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::keys;
use crate::kind::{StageKind, StageSettings};
use crate::types::ArtifactKind;

/// Crate path used in generated `use` lines.
pub const CRATE_PATH: &str = "linkchain_pipeline";

/// Generated source for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEmission {
    /// Complete `use` lines the body needs.
    pub imports: BTreeSet<String>,
    /// Name of the generated function.
    pub method_name: String,
    /// The function definition.
    pub body: String,
}

/// One argument of a generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Rust identifier.
    pub name: String,
    /// Input key the argument feeds.
    pub key: String,
    /// Type of the argument.
    pub kind: ArtifactKind,
}

/// A struct literal holding the current settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLiteral {
    /// Struct name.
    pub type_name: &'static str,
    /// Field names and their Rust expressions, in declaration order.
    pub fields: Vec<(&'static str, String)>,
}

/// Structured description of a generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTemplate {
    /// Function name.
    pub name: String,
    /// Arguments, in input order.
    pub params: Vec<Parameter>,
    /// Return type.
    pub output: ArtifactKind,
    /// Settings bound to a `settings` local before the call.
    pub settings: Option<SettingsLiteral>,
    /// Final expression.
    pub call: String,
    /// `use` lines required by the parameters, literal and call.
    pub imports: BTreeSet<String>,
}

/// Method name for a kind, disambiguated by `suffix` when non-empty.
#[must_use]
pub fn method_name(kind: StageKind, suffix: &str) -> String {
    if suffix.is_empty() {
        kind.module().to_owned()
    } else {
        format!("{}_{suffix}", kind.module())
    }
}

impl MethodTemplate {
    /// Describe a stage with the given settings and input shapes.
    ///
    /// `inputs` lists `(input key, artifact kind)` pairs as fed to the
    /// stage. A single input is named `input`; multiple inputs are named
    /// after their lower-cased keys. An input the call needs but that was
    /// never fed becomes a placeholder expression.
    #[must_use]
    pub fn new(settings: &StageSettings, inputs: &[(&str, ArtifactKind)], suffix: &str) -> Self {
        let kind = settings.kind();
        let module = kind.module();
        let mut imports = BTreeSet::new();
        imports.insert(format!("use {CRATE_PATH}::{module};"));

        let params: Vec<Parameter> = match inputs {
            [] => vec![Parameter {
                name: "input".to_owned(),
                key: kind.primary_key().to_owned(),
                kind: StageKind::input_kind(kind.primary_key()),
            }],
            [(key, artifact)] => vec![Parameter {
                name: "input".to_owned(),
                key: (*key).to_owned(),
                kind: *artifact,
            }],
            _ => inputs
                .iter()
                .map(|(key, artifact)| Parameter {
                    name: key.to_ascii_lowercase(),
                    key: (*key).to_owned(),
                    kind: *artifact,
                })
                .collect(),
        };
        for param in &params {
            imports.insert(type_import(param.kind));
        }
        imports.insert(type_import(kind.output_kind()));

        let find = |key: &str| params.iter().find(|p| p.key == key);
        let primary = argument(
            find(kind.primary_key()),
            StageKind::input_kind(kind.primary_key()),
            &mut imports,
        );

        let (settings, call) = match settings {
            StageSettings::Crop(s) => (
                Some(SettingsLiteral {
                    type_name: "CropSettings",
                    fields: vec![
                        ("left", s.left.to_string()),
                        ("right", s.right.to_string()),
                        ("top", s.top.to_string()),
                        ("bottom", s.bottom.to_string()),
                    ],
                }),
                format!("{module}::apply({primary}, &settings)"),
            ),
            StageSettings::Threshold(s) => (
                Some(SettingsLiteral {
                    type_name: "ThresholdSettings",
                    fields: vec![
                        ("hue_min", s.hue_min.to_string()),
                        ("hue_max", s.hue_max.to_string()),
                        ("sat_min", s.sat_min.to_string()),
                        ("sat_max", s.sat_max.to_string()),
                        ("val_min", s.val_min.to_string()),
                        ("val_max", s.val_max.to_string()),
                        ("invert", s.invert.to_string()),
                    ],
                }),
                format!("{module}::apply({primary}, &settings)"),
            ),
            StageSettings::Contours(s) => {
                imports.insert(format!("use {CRATE_PATH}::contours::ApproxMethod;"));
                imports.insert(format!("use {CRATE_PATH}::contours::RetrievalMode;"));
                (
                    Some(SettingsLiteral {
                        type_name: "ContourSettings",
                        fields: vec![
                            ("mode", format!("RetrievalMode::{:?}", s.mode)),
                            ("method", format!("ApproxMethod::{:?}", s.method)),
                        ],
                    }),
                    format!("{module}::apply({primary}, &settings)"),
                )
            }
            StageSettings::Pictograph | StageSettings::Mineral => {
                let backdrop = match find(keys::IMAGE) {
                    Some(param) => format!(
                        "Some({})",
                        argument(Some(param), ArtifactKind::Image, &mut imports)
                    ),
                    None => "None".to_owned(),
                };
                (None, format!("{module}::classify({primary}, {backdrop})"))
            }
        };
        if let Some(literal) = &settings {
            imports.insert(format!("use {CRATE_PATH}::{module}::{};", literal.type_name));
        }

        Self {
            name: method_name(kind, suffix),
            params,
            output: kind.output_kind(),
            settings,
            call,
            imports,
        }
    }

    /// Format the method.
    #[must_use]
    pub fn render(&self) -> StageEmission {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: &{}", p.name, p.kind.type_name()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut body = String::new();
        let _ = writeln!(
            body,
            "pub fn {}({params}) -> {} {{",
            self.name,
            self.output.type_name()
        );
        if let Some(literal) = &self.settings {
            let _ = writeln!(body, "    let settings = {} {{", literal.type_name);
            for (field, value) in &literal.fields {
                let _ = writeln!(body, "        {field}: {value},");
            }
            let _ = writeln!(body, "    }};");
        }
        let _ = writeln!(body, "    {}", self.call);
        let _ = writeln!(body, "}}");

        StageEmission {
            imports: self.imports.clone(),
            method_name: self.name.clone(),
            body,
        }
    }
}

fn type_import(kind: ArtifactKind) -> String {
    format!("use {CRATE_PATH}::types::{};", kind.type_name())
}

/// Expression passing `param` where `want` is expected.
fn argument(param: Option<&Parameter>, want: ArtifactKind, imports: &mut BTreeSet<String>) -> String {
    match param {
        Some(p) if p.kind == want => p.name.clone(),
        Some(p) => {
            let (convert, method) = match want {
                ArtifactKind::Points => ("ToPoints", "to_points"),
                ArtifactKind::Contours => ("ToContours", "to_contours"),
                ArtifactKind::Image | ArtifactKind::Classification => ("ToImage", "to_image"),
            };
            imports.insert(format!("use {CRATE_PATH}::artifact::{convert};"));
            format!("&{}.{method}()", p.name)
        }
        None => {
            let placeholder = match want {
                ArtifactKind::Points => "placeholder_points",
                ArtifactKind::Contours => "placeholder_contours",
                ArtifactKind::Image | ArtifactKind::Classification => "placeholder_image",
            };
            imports.insert(format!("use {CRATE_PATH}::artifact::{placeholder};"));
            format!("&{placeholder}()")
        }
    }
}
