use anyhow::Result;
use bench_sweep_evaluator::{
    chart::{ChartRenderer, ChartSpec, CsvDataRenderer, ImageFormat},
    config::AnalysisConfig,
    pingpong::{compare_bandwidth, compare_stem, series_files, PingpongSeries},
    record::PingpongRecord,
};

#[test]
fn t_series_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("inter-node");
    std::fs::write(
        &path,
        "x size 10:0.001,rest:500000000bytes/s\n\
         x size 20:0.002,rest:250000000bytes/s\n",
    )?;
    let series = PingpongSeries::read_file(&path)?;
    assert_eq!(series.name, "inter-node");
    assert!(series.dropped.is_empty());
    assert_eq!(
        series.records,
        [
            PingpongRecord {
                packet_size: 10,
                elapsed_time: 0.001,
                bandwidth: 5e8
            },
            PingpongRecord {
                packet_size: 20,
                elapsed_time: 0.002,
                bandwidth: 2.5e8
            }
        ]
    );
    Ok(())
}

#[test]
fn t_directory_and_compare() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    std::fs::write(
        root.join("multiple"),
        "x size 1:0.5,rest:2000000bytes/s\nx size 2:0.5,rest:4000000bytes/s\n",
    )?;
    std::fs::write(
        root.join("single"),
        "x size 1:0.5,rest:1000000bytes/s\nx size 2:0.5,rest:3000000bytes/s\n\
         x size 4:0.5,rest:5000000bytes/s\n",
    )?;
    std::fs::write(root.join("single.png"), "")?;
    std::fs::write(root.join("pingpong.c"), "")?;

    let config = AnalysisConfig::default();
    let files = series_files(root, &config.pingpong_non_data_suffixes)?;
    assert_eq!(files, [root.join("multiple"), root.join("single")]);

    let a = PingpongSeries::read_file(&files[0])?;
    let b = PingpongSeries::read_file(&files[1])?;
    let table = compare_bandwidth(&a, &b);
    assert_eq!(table.len(), 2);

    let out = root.join("out");
    let mut renderer = CsvDataRenderer::new(&out)?;
    let path = renderer.render(&ChartSpec {
        stem: compare_stem(&a, &b),
        title: String::new(),
        x_label: String::new(),
        y_label: String::new(),
        format: ImageFormat::Png,
        data: &table,
    })?;
    assert_eq!(path, Some(out.join("multiple===single_compare.png.csv")));
    let csv = std::fs::read_to_string(out.join("multiple===single_compare.png.csv"))?;
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        [
            "index,bandwidth multiple (MB/s),bandwidth single (MB/s)",
            "0,2,1",
            "1,4,3"
        ]
    );
    Ok(())
}
