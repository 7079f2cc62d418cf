//! End to end conversion tests
//!
//! These build small OBJ/MTL/texture sets in a scratch directory, run the
//! converter and decode the written LAS file with the `las` crate.

use approx::assert_abs_diff_eq;
use ::image::{Rgb as Pixel, RgbImage};
use ::las::Reader;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::process::Command;
use texcloud::algorithms::{sample_texture, MaterialColorizer, SamplerConfig};
use texcloud::io::{load_texture, read_transform_sidecar};
use texcloud::prelude::*;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn open_las(path: impl AsRef<Path>) -> Reader {
    let file = File::open(path).unwrap();
    Reader::new(BufReader::new(file)).unwrap()
}

fn read_points(path: impl AsRef<Path>) -> Vec<::las::Point> {
    let mut reader = open_las(path);
    reader.points().map(|p| p.unwrap()).collect()
}

fn point_color(point: &::las::Point) -> Rgb16 {
    let color = point.color.expect("point format 3 carries color");
    Rgb16::new(color.red, color.green, color.blue)
}

#[test]
fn test_flat_diffuse_georeferenced_mesh() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "site.mtl", "newmtl gray\nKd 0.5 0.5 0.5\n");
    write(
        dir.path(),
        "site.obj",
        "mtllib site.mtl\n\
         v 1000000.2 2000000.7 10.0\n\
         v 1000000.4 2000000.9 12.0\n\
         usemtl gray\n\
         f 1 2\n",
    );
    let las_path = dir.path().join("site.las");

    let report = ObjToLasConverter::default()
        .convert(dir.path().join("site.obj"), &las_path)
        .unwrap();
    assert_eq!(report.las.point_count, 2);
    assert!(report.transform.needs_transform);

    let sidecar = dir.path().join("site_transform.txt");
    assert_eq!(report.sidecar.as_deref(), Some(sidecar.as_path()));
    let text = fs::read_to_string(&sidecar).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "global_x_offset -1000000",
            "global_y_offset -2000000",
            "global_z_offset 0",
            "scale 1"
        ]
    );
    let transform = read_transform_sidecar(&sidecar).unwrap();
    assert_eq!(transform.x_offset, -1_000_000.0);

    let reader = open_las(&las_path);
    assert_eq!(reader.header().version(), ::las::Version::new(1, 3));
    assert_eq!(reader.header().number_of_points(), 2);
    let bounds = reader.header().bounds();
    assert_abs_diff_eq!(bounds.min.x, 0.2, epsilon = 0.0005);
    assert_abs_diff_eq!(bounds.max.z, 12.0, epsilon = 0.0005);

    let points = read_points(&las_path);
    assert_eq!(points.len(), 2);
    let expected = [[0.2, 0.7, 10.0], [0.4, 0.9, 12.0]];
    for (point, expected) in points.iter().zip(&expected) {
        assert_abs_diff_eq!(point.x, expected[0], epsilon = 0.0005);
        assert_abs_diff_eq!(point.y, expected[1], epsilon = 0.0005);
        assert_abs_diff_eq!(point.z, expected[2], epsilon = 0.0005);
        assert_eq!(point.return_number, 1);
        assert_eq!(point.number_of_returns, 1);

        let color = point_color(point).to_rgb();
        assert_abs_diff_eq!(color.r, 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(color.g, 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(color.b, 0.5, epsilon = 1e-4);
    }

    let size = fs::metadata(&las_path).unwrap().len();
    assert_eq!(size, 235 + 2 * 34);
}

#[test]
fn test_missing_texture_falls_back_to_diffuse() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "scene.mtl",
        "newmtl facade\nKd 0.2 0.3 0.4\nmap_Kd textures/missing.jpg\n\
         newmtl roof\nKd 0.9 0.1 0.1\n",
    );
    write(
        dir.path(),
        "scene.obj",
        "mtllib scene.mtl\n\
         v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 2 2 2\n\
         vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
         usemtl facade\n\
         f 1/1 2/2 3/3\n\
         usemtl roof\n\
         f 4/4 5/4 4/4\n",
    );
    let las_path = dir.path().join("scene.las");

    let report = ObjToLasConverter::default()
        .convert(dir.path().join("scene.obj"), &las_path)
        .unwrap();
    assert_eq!(report.material_count, 2);
    assert_eq!(report.textured_materials, 1);
    assert_eq!(report.failed_textures.len(), 1);
    assert_eq!(report.failed_textures[0].material, "facade");
    assert!(report.sidecar.is_none());
    assert!(!dir.path().join("scene_transform.txt").exists());

    let points = read_points(&las_path);
    let facade = Rgb::new(0.2, 0.3, 0.4).to_rgb16();
    let roof = Rgb::new(0.9, 0.1, 0.1).to_rgb16();
    let colors: Vec<Rgb16> = points.iter().map(point_color).collect();
    assert_eq!(colors, vec![facade, facade, facade, roof, roof]);
}

#[test]
fn test_textured_material_samples_texture() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("tex")).unwrap();
    let texture_path = dir.path().join("tex").join("wall.png");
    let mut img = RgbImage::from_pixel(3, 3, Pixel([120, 60, 30]));
    img.put_pixel(0, 0, Pixel([250, 250, 250]));
    img.put_pixel(1, 1, Pixel([10, 200, 90]));
    img.save(&texture_path).unwrap();

    write(dir.path(), "wall.mtl", "newmtl wall\nKd 0.3 0.3 0.3\nmap_Kd -s 1 1 1 tex\\wall.png\n");
    write(
        dir.path(),
        "wall.obj",
        "mtllib wall.mtl\n\
         v 0 0 0\nv 1 0 0\nv 1 1 0\n\
         vt 0.75 0.25\nvt 0.1 0.9\nvt 0.6 0.6\n\
         usemtl wall\n\
         f 1/1 2/2 3/3\n",
    );
    let las_path = dir.path().join("wall.las");
    let report = ObjToLasConverter::default()
        .convert(dir.path().join("wall.obj"), &las_path)
        .unwrap();
    assert!(report.failed_textures.is_empty());

    let texture = load_texture(&texture_path).unwrap();
    let colorizer = MaterialColorizer::default();
    let expected = |u: f32, v: f32| {
        let sample = sample_texture(&texture, u, 1.0 - v, &SamplerConfig::default());
        colorizer.gamma_correct(sample).with_floor(0.01).to_rgb16()
    };

    let colors: Vec<Rgb16> = read_points(&las_path).iter().map(point_color).collect();
    assert_eq!(colors.len(), 3);
    assert_eq!(colors[0], expected(0.75, 0.25));
    assert_eq!(colors[1], expected(0.1, 0.9));
    assert_eq!(colors[2], expected(0.6, 0.6));

    // v is flipped: (0.75, 0.25) lands on the center pixel
    let c = colors[0];
    assert!(c.g > c.r && c.g > c.b);
    let c = colors[1];
    assert!(c.r == c.g && c.g == c.b);
}

#[test]
fn test_sidecar_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "far.obj", "v 5000 7000 1\nv 5001 7001 2\nf 1 2\n");
    let options = ConversionOptions::default().with_sidecar(false);
    let report = ObjToLasConverter::new(options)
        .convert(dir.path().join("far.obj"), dir.path().join("far.las"))
        .unwrap();
    assert!(report.transform.needs_transform);
    assert!(report.sidecar.is_none());
    assert!(!dir.path().join("far_transform.txt").exists());

    // no materials: every point stays white
    let points = read_points(dir.path().join("far.las"));
    assert_eq!(points.len(), 2);
    assert!(points.iter().all(|p| point_color(p) == Rgb16::new(65535, 65535, 65535)));
}

#[test]
fn test_fatal_errors_are_classified() {
    let dir = tempfile::tempdir().unwrap();
    let converter = ObjToLasConverter::default();

    let err = converter
        .convert(dir.path().join("absent.obj"), dir.path().join("out.las"))
        .unwrap_err();
    assert_eq!(err.kind().to_string(), "input-access");

    write(dir.path(), "empty.obj", "# no geometry\n");
    let err = converter
        .convert(dir.path().join("empty.obj"), dir.path().join("out.las"))
        .unwrap_err();
    assert_eq!(err.kind().to_string(), "mesh-parse");

    write(dir.path(), "ok.obj", "v 0 0 0\nv 1 1 1\nf 1 2\n");
    let err = converter
        .convert(dir.path().join("ok.obj"), dir.path().join("no_dir").join("out.las"))
        .unwrap_err();
    assert_eq!(err.kind().to_string(), "output-write");
}

#[test]
fn test_non_finite_vertex_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nan.obj", "v nan 0 0\nv 2000000 5000 0\nv 2000001 5000 0\nf 1 2 3\n");
    let las_path = dir.path().join("nan.las");

    let err = ObjToLasConverter::default()
        .convert(dir.path().join("nan.obj"), &las_path)
        .unwrap_err();
    assert_eq!(err.kind().to_string(), "mesh-parse");
    assert!(!las_path.exists());
    assert!(!dir.path().join("nan_transform.txt").exists());
}

#[test]
fn test_unencodable_coordinates_leave_no_output() {
    let dir = tempfile::tempdir().unwrap();
    // a 3.5e6 spread overflows i32 at millimetre scale around the first point
    write(dir.path(), "wide.obj", "v 1000000 5000 0\nv 4500000 5000 0\nf 1 2\n");
    let las_path = dir.path().join("wide.las");

    let err = ObjToLasConverter::default()
        .convert(dir.path().join("wide.obj"), &las_path)
        .unwrap_err();
    assert_eq!(err.kind().to_string(), "output-write");
    assert!(err.to_string().contains("wide.las"));
    assert!(!las_path.exists());
    assert!(!dir.path().join("wide_transform.txt").exists());
}

#[test]
fn test_report_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
    let report = ObjToLasConverter::default()
        .convert(dir.path().join("tri.obj"), dir.path().join("tri.las"))
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["vertex_count"], 3);
    assert_eq!(json["las"]["point_count"], 3);
    assert_eq!(json["las"]["file_size"], 235 + 3 * 34);
    assert_eq!(json["transform"]["needs_transform"], false);
}

#[test]
fn test_cli_reports_errors_and_usage() {
    let dir = tempfile::tempdir().unwrap();
    let exe = env!("CARGO_BIN_EXE_obj2las");

    let usage = Command::new(exe).arg("only_one.obj").output().unwrap();
    assert!(!usage.status.success());

    let missing = Command::new(exe)
        .arg(dir.path().join("absent.obj"))
        .arg(dir.path().join("out.las"))
        .output()
        .unwrap();
    assert_eq!(missing.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&missing.stderr);
    assert!(stderr.contains("error[input-access]"));
    assert!(stderr.contains("absent.obj"));
}

#[test]
fn test_cli_converts_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
    let report_path = dir.path().join("report.json");

    let status = Command::new(env!("CARGO_BIN_EXE_obj2las"))
        .arg(dir.path().join("tri.obj"))
        .arg(dir.path().join("tri.las"))
        .arg("--report")
        .arg(&report_path)
        .arg("--log-level")
        .arg("warn")
        .status()
        .unwrap();
    assert!(status.success());

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["las"]["point_count"], 3);
    assert_eq!(fs::metadata(dir.path().join("tri.las")).unwrap().len(), 235 + 3 * 34);
}
