use rust_vision_transformer::architecture::{load_architecture, ViTConfig};
use rust_vision_transformer::config::{load_config, TrainingConfig};
use rust_vision_transformer::data::Dataset;
use rust_vision_transformer::trainer::Trainer;
use rust_vision_transformer::{Result, VisionTransformer};
use std::env;
use std::process;
use std::time::Instant;

// Vision Transformer on MNIST-format IDX data.
//
// Usage: vit_mnist [architecture.json] [training.json]
//
// Expects in ./data:
//   train-images.idx3-ubyte
//   train-labels.idx1-ubyte
//   t10k-images.idx3-ubyte
//   t10k-labels.idx1-ubyte
const TRAIN_IMAGES: &str = "./data/train-images.idx3-ubyte";
const TRAIN_LABELS: &str = "./data/train-labels.idx1-ubyte";
const TEST_IMAGES: &str = "./data/t10k-images.idx3-ubyte";
const TEST_LABELS: &str = "./data/t10k-labels.idx1-ubyte";
const CHECKPOINT_DIR: &str = "./vit_checkpoint";
const TRAIN_SAMPLES: usize = 60000;
const TEST_SAMPLES: usize = 10000;

fn run(args: &[String]) -> Result<()> {
    let architecture = match args.get(1) {
        Some(path) => load_architecture(path)?,
        None => ViTConfig::default(),
    };
    let training = match args.get(2) {
        Some(path) => load_config(path)?,
        None => TrainingConfig::default(),
    };

    println!("=== MNIST Vision Transformer ===");
    println!("Configuration:");
    println!(
        "  Model: img {}x{}, patch {}x{} ({} tokens + CLS), embed {}, heads {}, mlp {}, layers {}",
        architecture.img_size,
        architecture.img_size,
        architecture.patch_size,
        architecture.patch_size,
        architecture.num_patches(),
        architecture.embed_dim,
        architecture.num_heads,
        architecture.mlp_dim,
        architecture.num_layers
    );
    println!(
        "  Training: {} epochs, batch size {}, LR={}, warmup {} steps, {:?}",
        training.epochs,
        training.batch_size,
        training.learning_rate,
        training.warmup_steps,
        training.optimizer
    );
    println!();

    println!("Loading MNIST data...");
    let train = Dataset::load(TRAIN_IMAGES, TRAIN_LABELS, Some(TRAIN_SAMPLES))?;
    let test = Dataset::load(TEST_IMAGES, TEST_LABELS, Some(TEST_SAMPLES))?;
    println!("  {} training samples, {} test samples", train.len(), test.len());

    let seed = architecture.seed;
    let mut model = VisionTransformer::new(architecture)?;
    println!(
        "Model: {} parameters on {} backend",
        model.parameter_count(),
        model.device().name()
    );

    let mut trainer = Trainer::new(training, seed)?;
    println!("Training...");
    let train_start = Instant::now();
    let report = trainer.fit(&mut model, &train, Some(&test))?;
    println!("Training time: {:.2}s", train_start.elapsed().as_secs_f64());

    if let Some(last) = report.last() {
        println!(
            "Final epoch: loss {:.4}, accuracy {:.2}%",
            last.train_loss,
            last.train_accuracy * 100.0
        );
    }

    let evaluation = trainer.evaluate(&model, &test, test.len())?;
    println!(
        "Test: loss {:.4}, accuracy {:.2}% on {} samples",
        evaluation.loss,
        evaluation.accuracy * 100.0,
        evaluation.samples
    );

    model.save_checkpoint(CHECKPOINT_DIR)?;
    println!("Checkpoint written to {CHECKPOINT_DIR}");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
