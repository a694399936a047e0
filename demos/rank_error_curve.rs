// Relative error of the rank-k approximation of a noisy gradient image.

use plotters::prelude::*;
use svd_image::prelude::*;
use svd_image::random_matrix::random_smooth_raster;

pub fn main() {
    let (width, height) = (160, 120);

    let mut rng = rand::thread_rng();
    let source = random_smooth_raster(width, height, 8.0, &mut rng);

    let mut pipeline = CompressionPipeline::default();
    let prepared = pipeline.prepare(&source).unwrap();
    let max_rank = prepared.max_rank() as i64;

    let res: Vec<(i64, f64)> = (1..max_rank)
        .map(|rank| {
            let output = pipeline.render(&prepared, rank).unwrap();
            (rank, output.stats.relative_error)
        })
        .filter(|&(_, error)| error > 0.0)
        .collect();

    let root = BitMapBackend::new("rank_error.png", (640, 480)).into_drawing_area();
    root.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(20)
        .y_label_area_size(50)
        .build_cartesian_2d(1..max_rank, (1E-4..1.0).log_scale())
        .unwrap();

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(10)
        .y_label_formatter(&|item| format!("{:.1E}", item))
        .y_desc("Relative Error")
        .draw()
        .unwrap();
    chart
        .draw_series(LineSeries::new(res, &BLACK))
        .unwrap()
        .label("truncation error")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));

    chart.configure_series_labels().draw().unwrap();

    println!("Rank: {}", max_rank);
}
