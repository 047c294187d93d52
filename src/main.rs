use std::io::{self, Write};
use std::time::Instant;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rayon::prelude::*;

use lazy_find::cli::Cli;
use lazy_find::{Finder, Output};

fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 初始化日志
    env_logger::Builder::new()
        .filter_level(if cli.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("开始运行 lazy-find");
    let start_time = Instant::now();

    cli.validate().context("无效的搜索路径")?;
    let finder = Finder::new(&cli.build_spec()).context("无效的查找选项")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.parallel {
        // 同一个 Finder 在各路径间共享，按路径顺序输出结果
        let results: Vec<Vec<Output>> = cli
            .paths
            .par_iter()
            .map(|path| finder.find(path).collect())
            .collect();
        for output in results.iter().flatten() {
            writeln!(out, "{}", output)?;
        }
    } else {
        for path in &cli.paths {
            debug!("在路径中搜索: {}", path);
            for output in finder.find(path) {
                writeln!(out, "{}", output)?;
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!("搜索完成，耗时 {:.2?}", elapsed);

    Ok(())
}
