use smdforge::prelude::*;
use smdforge::converter::BatchPhase;

use glam::{Vec2, Vec3};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::tempdir;

/// A model every codec can carry losslessly: one block of each storable
/// kind, sequential keyframes, parent bone 0 and six-decimal values.
fn sample_model() -> SmdFile {
    let vertex = |x: f32, bone: i16| {
        Vertex::new(0, Vec3::new(x, 0.5, -1.25), Vec3::Z, Vec2::new(0.25, 0.75))
            .with_link(bone, 0.5)
            .with_link(0, 0.5)
    };
    SmdFile::new()
        .with_block(NodesBlock {
            bones: vec![
                Bone::new(0, "root", -1),
                Bone::new(1, "spine", 0),
                Bone::new(2, "head \"top\"", 1),
            ],
        })
        .with_block(SkeletonBlock {
            keyframes: vec![
                Keyframe::with_states(
                    0,
                    vec![
                        BoneState::new(0, Vec3::ZERO, Vec3::ZERO),
                        BoneState::new(1, Vec3::new(0.0, 2.5, 0.0), Vec3::new(0.0, 0.0, 1.5)),
                    ],
                ),
                Keyframe::with_states(1, vec![BoneState::new(2, Vec3::X, Vec3::NEG_Y)]),
            ],
        })
        .with_block(TrianglesBlock {
            triangles: vec![
                Triangle::new("body.png", [vertex(0.0, 1), vertex(1.0, 1), vertex(2.0, 2)]),
                Triangle::new("eyes.png", [vertex(3.0, 2), vertex(4.0, 2), vertex(5.0, 2)]),
            ],
        })
}

#[test]
fn test_round_trip_text() {
    let model = sample_model();
    assert_eq!(parse_smd(&to_smd_string(&model)).unwrap(), model);
}

#[test]
fn test_round_trip_bmd() {
    let model = sample_model();
    assert_eq!(parse_bmd_bytes(&serialize_bmd(&model).unwrap()).unwrap(), model);
}

#[test]
fn test_round_trip_smdx_with_vertex_animation() {
    let model = sample_model().with_block(VertexAnimationBlock {
        keyframes: vec![Keyframe::with_states(
            0,
            vec![VertexState::new(70000, Vec3::ONE, Vec3::Z)],
        )],
    });
    assert_eq!(parse_smdx_bytes(&serialize_smdx(&model).unwrap()).unwrap(), model);
}

#[test]
fn test_zero_vector_formatting() {
    let text = to_smd_string(&sample_model());
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines.contains(&"0  0 0 0  0 0 0"));
    assert!(lines.contains(&"1  0.000000 2.500000 0.000000  0.000000 0.000000 1.500000"));
}

#[test]
fn test_material_table_determinism() {
    let v = Vertex::new(0, Vec3::ZERO, Vec3::Z, Vec2::ZERO);
    let block = TrianglesBlock {
        triangles: ["A", "B", "A", "C"]
            .iter()
            .map(|m| Triangle::new(*m, [v.clone(), v.clone(), v.clone()]))
            .collect(),
    };

    let table = MaterialTable::from_triangles(&block);
    assert_eq!(table.names().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert_eq!(table.indices(), &[0, 1, 0, 2]);
}

#[test]
fn test_section_emission_skips_empty_blocks() {
    let model = SmdFile::new()
        .with_block(NodesBlock {
            bones: vec![Bone::new(0, "root", -1)],
        })
        .with_block(SkeletonBlock {
            keyframes: vec![Keyframe::new(0)],
        })
        .with_block(TrianglesBlock::default())
        .with_block(VertexAnimationBlock::default());

    let text = to_smd_string(&model);
    assert_eq!(
        text,
        "version 1\nnodes\n0 \"root\" -1\nend\nskeleton\ntime 0\nend\n"
    );
}

#[test]
fn test_malformed_input_rejection() {
    let err = parse_smd("nodes\n0 \"root\" -1\n").unwrap_err();
    assert!(err.is_format_error(), "{err}");

    let bytes = serialize_bmd(&sample_model()).unwrap();
    let err = parse_bmd_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(err.is_codec_error(), "{err}");
}

#[test]
fn test_convert_file_chain() {
    let dir = tempdir().unwrap();
    let smd = dir.path().join("body.smd");
    let bmd = dir.path().join("packed/body.bmd");
    let smdx = dir.path().join("typed/body.smdx");
    let back = dir.path().join("back/body.smd");

    write_smd(&sample_model(), &smd).unwrap();
    convert_file(&smd, &bmd).unwrap();
    convert_file(&bmd, &smdx).unwrap();
    convert_file(&smdx, &back).unwrap();

    assert_eq!(
        fs::read_to_string(&back).unwrap(),
        fs::read_to_string(&smd).unwrap()
    );
    assert_eq!(read_model(&smdx).unwrap(), sample_model());
}

#[test]
fn test_convert_file_reports_file_identity() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.bmd");
    fs::write(&broken, [1u8, 0]).unwrap();

    let err = convert_file(&broken, &dir.path().join("broken.smd")).unwrap_err();
    assert!(err.is_codec_error());
    assert!(err.to_string().contains("broken.bmd"));
}

#[test]
fn test_lenient_text_feeds_packed_encoder() {
    let dir = tempdir().unwrap();
    let smd = dir.path().join("body.smd");
    fs::write(
        &smd,
        "// exported by studiomdl\nversion 1\nnodes\n0 \"root\" -1\nend\nskeleton\ntime 0\nend\n",
    )
    .unwrap();

    assert!(read_smd(&smd).is_err());
    convert_file(&smd, &dir.path().join("body.bmd")).unwrap();
    let model = read_bmd(dir.path().join("body.bmd")).unwrap();
    assert_eq!(model.nodes().unwrap().bones.len(), 1);
}

fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    let cursor = writer.finish().unwrap();
    fs::write(path, cursor.into_inner()).unwrap();
}

#[test]
fn test_batch_decode_from_archive() {
    let dir = tempdir().unwrap();
    let jar = dir.path().join("Pixelmon.jar");
    let out = dir.path().join("out");
    let packed = serialize_bmd(&sample_model()).unwrap();

    write_jar(
        &jar,
        &[
            ("assets/pixelmon/models/pokemon/eevee/eevee.bmd", packed.as_slice()),
            ("assets/pixelmon/models/pokemon/eevee/eevee.pqc", &b"$body eevee.smd"[..]),
            ("assets/pixelmon/models/pokemon/eevee/eevee.png", &b"png"[..]),
            ("assets/pixelmon/lang/en_us.lang", &b"lang"[..]),
        ],
    );

    let options = BatchOptions::new(Variant::Reforged, Direction::Decode);
    let phases = std::sync::Mutex::new(Vec::new());
    let result = batch_convert(&jar, &out, &options, |p| {
        phases.lock().unwrap().push(p.phase);
    })
    .unwrap();

    assert!(result.is_success());
    assert_eq!(result.processed, 2);
    assert_eq!(
        read_smd(out.join("eevee/eevee.smd")).unwrap(),
        sample_model()
    );
    assert_eq!(
        fs::read_to_string(out.join("eevee/eevee.pqc")).unwrap(),
        "$body eevee.smd"
    );
    assert!(!out.join("eevee/eevee.png").exists());
    assert!(phases.into_inner().unwrap().contains(&BatchPhase::ReadingArchive));
}

#[test]
fn test_archive_encode_is_unsupported() {
    let dir = tempdir().unwrap();
    let jar = dir.path().join("models.jar");
    write_jar(&jar, &[]);

    let options = BatchOptions::new(Variant::Reforged, Direction::Encode);
    let err = batch_convert(&jar, &dir.path().join("out"), &options, |_| {}).unwrap_err();
    assert!(matches!(err, Error::UnsupportedConversion { .. }));
}

#[test]
fn test_inspect_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("body.smdx");
    write_smdx(&sample_model(), &path).unwrap();

    let summary = inspect_file(&path).unwrap();
    assert_eq!(summary.format.as_deref(), Some("smdx"));
    assert_eq!(summary.bones, 3);
    assert_eq!(summary.keyframes, 2);
    assert_eq!(summary.triangles, 2);
    assert_eq!(summary.materials, vec!["body.png", "eyes.png"]);
}
