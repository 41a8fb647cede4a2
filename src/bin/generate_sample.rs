//! Writes a deterministic sample housing CSV for demos and manual testing.
//!
//! The first column (`price`) is the training target; `age` and `rooms` are
//! numeric, `city` and `condition` categorical. A few percent of the cells
//! are left empty to exercise imputation.

use std::error::Error;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut rng = SimpleRng::new(42);

    const N_ROWS: usize = 200;
    const MISSING_RATE: f64 = 0.04;

    let cities = ["Oslo", "Bergen", "Trondheim"];
    let conditions = ["new", "renovated", "worn"];
    let city_premium = |city: &str| match city {
        "Oslo" => 60.0,
        "Bergen" => 35.0,
        _ => 0.0,
    };
    let condition_premium = |condition: &str| match condition {
        "new" => 40.0,
        "renovated" => 15.0,
        _ => 0.0,
    };

    std::fs::create_dir_all("sample_data")?;
    let mut writer = csv::Writer::from_path("sample_data/housing.csv")?;
    writer.write_record(["price", "age", "rooms", "city", "condition"])?;

    for _ in 0..N_ROWS {
        let age = (rng.next_f64() * 60.0).round();
        let rooms = 1 + (rng.next_u64() % 5) as i64;
        let city = rng.pick(&cities);
        let condition = rng.pick(&conditions);

        let price = 250.0 - 2.0 * age
            + 45.0 * rooms as f64
            + city_premium(city)
            + condition_premium(condition)
            + rng.gauss(0.0, 12.0);

        // Sprinkle missing cells over the feature columns only; the target
        // must stay complete for training.
        let age_cell = if rng.next_f64() < MISSING_RATE {
            String::new()
        } else {
            format!("{age}")
        };
        let rooms_cell = if rng.next_f64() < MISSING_RATE {
            String::new()
        } else {
            format!("{rooms}")
        };
        let city_cell = if rng.next_f64() < MISSING_RATE { "" } else { city };

        writer.write_record([
            format!("{price:.1}"),
            age_cell,
            rooms_cell,
            city_cell.to_string(),
            condition.to_string(),
        ])?;
    }

    writer.flush()?;
    println!("Wrote sample_data/housing.csv ({N_ROWS} rows)");
    Ok(())
}
