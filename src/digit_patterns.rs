use lifnet::classifier::Sample;
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};

pub const GRID_SIZE: usize = 7;
pub const NUM_DIGITS: usize = 10;

enum Stroke {
    Line(i64, i64, i64, i64),
    Circle(i64, i64, f64),
}

fn strokes(digit: usize) -> Vec<Stroke> {
    use Stroke::*;

    match digit {
        0 => vec![Circle(3, 3, 2.5)],
        1 => vec![Line(3, 1, 3, 5)],
        2 => vec![
            Line(1, 1, 5, 1),
            Line(5, 1, 5, 3),
            Line(5, 3, 1, 3),
            Line(1, 3, 1, 5),
            Line(1, 5, 5, 5),
        ],
        3 => vec![
            Line(1, 1, 4, 1),
            Line(1, 3, 4, 3),
            Line(1, 5, 4, 5),
            Line(5, 1, 5, 5),
        ],
        4 => vec![Line(1, 1, 1, 3), Line(1, 3, 5, 3), Line(5, 1, 5, 5)],
        5 => vec![
            Line(5, 1, 1, 1),
            Line(1, 1, 1, 3),
            Line(1, 3, 5, 3),
            Line(5, 3, 5, 5),
            Line(5, 5, 1, 5),
        ],
        6 => vec![Circle(3, 4, 2.0), Line(1, 3, 1, 5)],
        7 => vec![Line(1, 1, 5, 1), Line(5, 1, 3, 5)],
        8 => vec![Circle(3, 2, 1.5), Circle(3, 5, 1.5)],
        9 => vec![Circle(3, 3, 2.0), Line(5, 1, 5, 3)],
        _ => Vec::new(),
    }
}

fn set_pixel(pattern: &mut [f64], x: i64, y: i64) {
    let grid = GRID_SIZE as i64;
    if (0..grid).contains(&x) && (0..grid).contains(&y) {
        pattern[(y * grid + x) as usize] = 1.0;
    }
}

fn draw(pattern: &mut [f64], stroke: &Stroke) {
    match *stroke {
        Stroke::Line(x1, y1, x2, y2) => {
            let steps = (x2 - x1).abs().max((y2 - y1).abs());
            for i in 0..=steps {
                let t = if steps > 0 {
                    i as f64 / steps as f64
                } else {
                    0.0
                };
                let x = (x1 as f64 + t * (x2 - x1) as f64) as i64;
                let y = (y1 as f64 + t * (y2 - y1) as f64) as i64;
                set_pixel(pattern, x, y);
            }
        }
        Stroke::Circle(cx, cy, radius) => {
            for y in 0..GRID_SIZE as i64 {
                for x in 0..GRID_SIZE as i64 {
                    let dist = (((x - cx).pow(2) + (y - cy).pow(2)) as f64).sqrt();
                    if (dist - radius).abs() < 0.5 {
                        set_pixel(pattern, x, y);
                    }
                }
            }
        }
    }
}

/// Deterministic noisy 7x7 rendering of `digit`. Labels outside 0..=9 yield pure noise.
pub fn digit_pattern(digit: usize, variation: u64, seed: u64) -> Vec<f64> {
    let mut pattern = vec![0.0; GRID_SIZE * GRID_SIZE];

    for stroke in strokes(digit) {
        draw(&mut pattern, &stroke);
    }

    let mut rng = StdRng::seed_from_u64(seed ^ (digit as u64 * 1000 + variation));
    let noise = Uniform::new(-0.1, 0.1);

    for pixel in &mut pattern {
        *pixel = (*pixel + noise.sample(&mut rng)).clamp(0.0, 1.0);
    }

    pattern
}

pub fn synthetic_dataset(samples_per_digit: usize, seed: u64) -> Vec<Sample> {
    (0..NUM_DIGITS)
        .flat_map(|digit| {
            (0..samples_per_digit as u64).map(move |variation| Sample {
                pixels: digit_pattern(digit, variation, seed),
                label: digit,
            })
        })
        .collect()
}
