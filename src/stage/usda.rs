//! USDA 1.0 text serialisation of a [`Stage`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use glam::DMat4;

use crate::errors::Result;
use crate::stage::attribute::{Attribute, Value, Variability};
use crate::stage::prim::PrimId;
use crate::stage::Stage;

const INDENT: &str = "    ";

fn join<T>(items: &[T], format: impl Fn(&T) -> String) -> String {
    let items: Vec<String> = items.iter().map(format).collect();
    format!("[{}]", items.join(", "))
}

fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{escaped}\"")
}

/// Paths containing `@` need the triple-delimited form.
fn format_asset(path: &str) -> String {
    if path.contains('@') {
        format!("@@@{}@@@", path.replace("@@@", "\\@@@"))
    } else {
        format!("@{path}@")
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Token(token) => quote(token),
        Value::TokenArray(tokens) => join(tokens, |token| quote(token)),
        Value::Asset(path) => format_asset(path),
        Value::Float(value) => format!("{value}"),
        Value::Float2(value) => format!("({}, {})", value.x, value.y),
        Value::Float3(value) | Value::Color3f(value) => {
            format!("({}, {}, {})", value.x, value.y, value.z)
        }
        Value::Matrix4d(matrix) => format_matrix(matrix),
        Value::Point3fArray(points) => join(points, |p| format!("({}, {}, {})", p.x, p.y, p.z)),
        Value::IntArray(values) => join(values, |value| value.to_string()),
        Value::TexCoord2fArray(uvs) => join(uvs, |uv| format!("({}, {})", uv.x, uv.y)),
    }
}

/// The document uses row vectors, so each glam column is written as a row.
fn format_matrix(matrix: &DMat4) -> String {
    let rows: Vec<String> = (0..4)
        .map(|index| {
            let column = matrix.col(index);
            format!("({}, {}, {}, {})", column.x, column.y, column.z, column.w)
        })
        .collect();
    format!("( {} )", rows.join(", "))
}

fn write_metadata(out: &mut impl Write, stage: &Stage) -> io::Result<()> {
    let metadata = &stage.metadata;

    writeln!(out, "#usda 1.0\n(")?;
    if let Some(default_prim) = &metadata.default_prim {
        writeln!(out, "{INDENT}defaultPrim = \"{default_prim}\"")?;
    }
    writeln!(out, "{INDENT}endTimeCode = {}", metadata.end_time_code)?;
    writeln!(out, "{INDENT}framesPerSecond = {}", metadata.frames_per_second)?;
    writeln!(out, "{INDENT}metersPerUnit = {}", metadata.meters_per_unit)?;
    writeln!(out, "{INDENT}startTimeCode = {}", metadata.start_time_code)?;
    writeln!(
        out,
        "{INDENT}timeCodesPerSecond = {}",
        metadata.time_codes_per_second
    )?;
    writeln!(out, "{INDENT}upAxis = \"{}\"", metadata.up_axis)?;
    writeln!(out, ")")
}

fn write_attribute(out: &mut impl Write, attribute: &Attribute, indent: &str) -> io::Result<()> {
    let uniform = match attribute.variability {
        Variability::Uniform => "uniform ",
        Variability::Varying => "",
    };
    let declaration = format!(
        "{indent}{uniform}{} {}",
        attribute.value_type.usda_name(),
        attribute.name
    );
    let metadata = attribute
        .interpolation
        .map(|interpolation| {
            format!(
                " (\n{indent}{INDENT}interpolation = \"{}\"\n{indent})",
                interpolation.token()
            )
        })
        .unwrap_or_default();

    let mut written = false;

    if let Some(value) = attribute.default_value() {
        writeln!(out, "{declaration} = {}{metadata}", format_value(value))?;
        written = true;
    }

    if attribute.is_time_sampled() {
        writeln!(out, "{declaration}.timeSamples = {{")?;
        for sample in attribute.samples() {
            writeln!(
                out,
                "{indent}{INDENT}{}: {},",
                sample.time,
                format_value(&sample.value)
            )?;
        }
        writeln!(out, "{indent}}}")?;
        written = true;
    }

    if let Some(connection) = &attribute.connection {
        writeln!(out, "{declaration}.connect = <{connection}>")?;
        written = true;
    }

    // Outputs and inputs that only exist to be connected to
    if !written {
        writeln!(out, "{declaration}{metadata}")?;
    }

    Ok(())
}

fn write_prim(out: &mut impl Write, stage: &Stage, id: PrimId, depth: usize) -> io::Result<()> {
    let Some(prim) = stage.prim(id) else {
        return Ok(());
    };

    let indent = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);

    match prim.prim_type.schema_name() {
        Some(schema) => write!(out, "{indent}def {schema} \"{}\"", prim.name)?,
        None => write!(out, "{indent}def \"{}\"", prim.name)?,
    }

    if prim.api_schemas.is_empty() {
        writeln!(out)?;
    } else {
        let schemas = join(&prim.api_schemas, |schema| format!("\"{schema}\""));
        writeln!(out, " (\n{inner}prepend apiSchemas = {schemas}\n{indent})")?;
    }

    writeln!(out, "{indent}{{")?;

    for attribute in prim.attributes() {
        write_attribute(out, attribute, &inner)?;
    }

    for (name, targets) in prim.relationships() {
        match targets.as_slice() {
            [single] => writeln!(out, "{inner}rel {name} = <{single}>")?,
            _ => {
                let targets = join(targets, |target| format!("<{target}>"));
                writeln!(out, "{inner}rel {name} = {targets}")?
            }
        }
    }

    let has_properties = !prim.attributes().is_empty() || !prim.relationships().is_empty();
    for (index, child_id) in prim.child_ids.iter().enumerate() {
        if index > 0 || has_properties {
            writeln!(out)?;
        }
        write_prim(out, stage, *child_id, depth + 1)?;
    }

    writeln!(out, "{indent}}}")
}

pub fn write_stage(stage: &Stage, out: &mut impl Write) -> Result<()> {
    write_metadata(out, stage)?;

    for root_id in stage.root_ids() {
        writeln!(out)?;
        write_prim(out, stage, *root_id, 0)?;
    }

    Ok(())
}

/// Renders the whole stage as USDA text.
pub fn to_usda_string(stage: &Stage) -> Result<String> {
    let mut buffer = Vec::new();
    write_stage(stage, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn save(stage: &Stage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_stage(stage, &mut writer)?;
    writer.flush()?;

    log::info!("Wrote stage to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::{DVec3, Vec2, Vec3};

    use super::*;
    use crate::stage::{Interpolation, ValueType, XformOp};

    fn sample_stage() -> Stage {
        let mut stage = Stage::new();
        stage.metadata.default_prim = Some("World".to_string());
        stage.metadata.end_time_code = 2.0;

        stage.define_xform("/World").unwrap();
        let xform = stage.define_xform("/World/Mesh_Xform_ball").unwrap();
        let scale = stage.add_xform_op(xform, XformOp::Scale).unwrap();
        stage
            .set_sample(&scale, Value::Float3(Vec3::new(1.0, 2.0, 3.0)), 0.0)
            .unwrap();
        stage
            .set_sample(&scale, Value::Float3(Vec3::ONE), 2.0)
            .unwrap();

        let mesh = stage.define_mesh("/World/Mesh_Xform_ball/Mesh_ball").unwrap();
        let uv = stage
            .create_attribute(mesh, "primvars:UVMap", ValueType::TexCoord2fArray)
            .unwrap();
        stage
            .set(&uv, Value::TexCoord2fArray(vec![Vec2::new(0.5, 1.0)]))
            .unwrap();
        stage
            .set_interpolation(&uv, Interpolation::FaceVarying)
            .unwrap();
        stage.apply_api_schema(mesh, "MaterialBindingAPI").unwrap();
        stage
            .set_relationship(
                mesh,
                "material:binding",
                vec!["/World/_materials/Material_ball".to_string()],
            )
            .unwrap();

        stage
    }

    #[test]
    fn tokens_and_assets_are_escaped() {
        assert_eq!(
            format_value(&Value::token("say \"hi\"")),
            "\"say \\\"hi\\\"\""
        );
        assert_eq!(
            format_value(&Value::Asset("textures/wood.png".to_string())),
            "@textures/wood.png@"
        );
        assert_eq!(
            format_value(&Value::Asset("scans/a@2x.png".to_string())),
            "@@@scans/a@2x.png@@@"
        );
        assert_eq!(
            format_value(&Value::Asset("odd@@@name.png".to_string())),
            "@@@odd\\@@@name.png@@@"
        );
    }

    #[test]
    fn layer_metadata_comes_first() {
        let text = to_usda_string(&sample_stage()).unwrap();
        assert!(text.starts_with("#usda 1.0\n(\n"));
        assert!(text.contains("defaultPrim = \"World\""));
        assert!(text.contains("endTimeCode = 2\n"));
    }

    #[test]
    fn time_samples_are_written_in_time_order() {
        let text = to_usda_string(&sample_stage()).unwrap();
        let expected = "float3 xformOp:scale.timeSamples = {\n            0: (1, 2, 3),\n            2: (1, 1, 1),\n        }";
        assert!(text.contains(expected), "{text}");
        assert!(text.contains("uniform token[] xformOpOrder = [\"xformOp:scale\"]"));
    }

    #[test]
    fn bindings_and_primvars_are_written() {
        let text = to_usda_string(&sample_stage()).unwrap();
        assert!(text.contains("def Mesh \"Mesh_ball\" (\n"));
        assert!(text.contains("prepend apiSchemas = [\"MaterialBindingAPI\"]"));
        assert!(text.contains("rel material:binding = </World/_materials/Material_ball>"));
        assert!(text.contains("texCoord2f[] primvars:UVMap = [(0.5, 1)] (\n"));
        assert!(text.contains("interpolation = \"faceVarying\""));
    }

    #[test]
    fn matrices_are_written_row_per_column() {
        let matrix = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            format_matrix(&matrix),
            "( (1, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (1, 2, 3, 1) )"
        );
    }

    #[test]
    fn save_writes_the_text_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.usda");
        let stage = sample_stage();
        save(&stage, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_usda_string(&stage).unwrap());
    }
}
