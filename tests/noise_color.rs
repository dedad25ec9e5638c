use rustfft::{num_complex::Complex, FftPlanner};
use yeep::dsp::{NoiseGenerator, NoiseKind};

const FFT_SIZE: usize = 4096;
const SEGMENTS: usize = 64;

/// Welch estimate: mean Hann-windowed power spectrum over `SEGMENTS` blocks.
fn power_spectrum(kind: NoiseKind, seed: u64) -> Vec<f64> {
    let mut generator = NoiseGenerator::with_seed(kind, FFT_SIZE, seed).unwrap();
    let fft = FftPlanner::<f32>::new().plan_fft_forward(FFT_SIZE);
    let window: Vec<f32> = (0..FFT_SIZE)
        .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / FFT_SIZE as f32).cos()))
        .collect();

    // Let the filters settle
    let mut block = vec![0.0f32; FFT_SIZE];
    generator.fill(&mut block);

    let mut power = vec![0.0f64; FFT_SIZE / 2];
    let mut buffer = vec![Complex::new(0.0f32, 0.0); FFT_SIZE];
    for _ in 0..SEGMENTS {
        generator.fill(&mut block);
        for ((slot, &s), &w) in buffer.iter_mut().zip(&block).zip(&window) {
            *slot = Complex::new(s * w, 0.0);
        }
        fft.process(&mut buffer);
        for (p, bin) in power.iter_mut().zip(&buffer) {
            *p += f64::from(bin.norm_sqr()) / SEGMENTS as f64;
        }
    }
    power
}

/// Least-squares slope of mean band power, in dB per octave, over the
/// octave bands starting at each of `starts`.
fn slope_db_per_octave(power: &[f64], starts: &[usize]) -> f64 {
    let points: Vec<(f64, f64)> = starts
        .iter()
        .enumerate()
        .map(|(octave, &k)| {
            let band = &power[k..2 * k];
            let mean = band.iter().sum::<f64>() / band.len() as f64;
            (octave as f64, 10.0 * mean.log10())
        })
        .collect();

    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let my = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxy: f64 = points.iter().map(|p| (p.0 - mx) * (p.1 - my)).sum();
    let sxx: f64 = points.iter().map(|p| (p.0 - mx).powi(2)).sum();
    sxy / sxx
}

#[test]
fn white_noise_is_flat() {
    let power = power_spectrum(NoiseKind::White, 1);
    let slope = slope_db_per_octave(&power, &[16, 32, 64, 128, 256, 512, 1024]);
    assert!(slope.abs() < 0.5, "white slope {slope:.2} dB/octave");
}

#[test]
fn pink_noise_falls_three_db_per_octave() {
    let power = power_spectrum(NoiseKind::Pink, 2);
    let slope = slope_db_per_octave(&power, &[16, 32, 64, 128, 256, 512]);
    assert!((-3.6..-2.4).contains(&slope), "pink slope {slope:.2} dB/octave");
}

#[test]
fn brown_noise_falls_six_db_per_octave() {
    let power = power_spectrum(NoiseKind::Brown, 3);
    let slope = slope_db_per_octave(&power, &[64, 128, 256, 512]);
    assert!((-6.8..-4.8).contains(&slope), "brown slope {slope:.2} dB/octave");
}

#[test]
fn brown_noise_stays_bounded() {
    let mut generator = NoiseGenerator::with_seed(NoiseKind::Brown, 1024, 4).unwrap();
    let mut block = vec![0.0f32; 1024];
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for _ in 0..1000 {
        generator.fill(&mut block);
        assert!(block.iter().all(|s| s.is_finite() && s.abs() <= 3.5));
        sum += block.iter().map(|&s| f64::from(s)).sum::<f64>();
        count += block.len();
    }
    let mean = sum / count as f64;
    assert!(mean.abs() < 0.1, "brown mean {mean}");
}
