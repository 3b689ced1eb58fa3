use clap::{Arg, Command};
use std::str::FromStr;
use tbsim::logging::{init_logging, level_from_verbosity, parse_log_level, LogConfig, LogOutput};
use tbsim::models::*;
use tbsim::scenario::ScenarioConfig;
use tbsim::simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("tbsim")
        .version("0.1.0")
        .about("終末弾道シミュレーション (Terminal Ballistics Simulation)")
        .long_about("弾丸が材質層を貫通する際の減速・偏向・エネルギー損失を計算します。\n\
                     YAMLシナリオで材質・弾丸・射撃を定義し、多層標的に対する結果を出力します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("REPORT")
                .help("結果レポート(.yaml)の保存先")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("既定材質に対するデモ射撃を実行")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .get_matches();

    println!("終末弾道シミュレーション (Terminal Ballistics Simulation) - tbsim v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    // ログ設定
    let log_output = matches
        .get_one::<String>("log-output")
        .map(|s| LogOutput::from_str(s))
        .unwrap_or(Ok(LogOutput::Console))
        .unwrap_or_else(|e| {
            eprintln!("警告: {}", e);
            LogOutput::Console
        });
    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| level_from_verbosity(verbose_level)),
        output: log_output,
        ..LogConfig::default()
    };
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("警告: ログ初期化に失敗しました: {}", e);
            None
        }
    };

    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    // デモモードの実行
    if matches.get_flag("test") {
        println!("=== デモ射撃モード ===");
        run_demonstration();
        return;
    }

    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        let output = matches.get_one::<String>("output").map(String::as_str);
        match run_scenario(scenario_path, matches.get_flag("info"), output, verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
    }
}

/// 既定材質すべてに小銃弾を撃ち込み、厚さごとの残速を表示
fn run_demonstration() {
    let calculator = PenetrationCalculator::with_defaults();
    let bullet = Bullet::nato_556x45().into_pointer();
    let hit = HitResult::new(Position3D::default(), Normal3D::new(-1.0, 0.0, 0.0));
    let velocity = Velocity3D::new(bullet.muzzle_velocity, 0.0, 0.0);
    let thicknesses = [0.5, 2.0, 10.0];

    println!(
        "弾丸: {} ({:.1}g, {:.0}m/s, {:.1}J)",
        bullet.name,
        bullet.mass * 1000.0,
        bullet.muzzle_velocity,
        bullet.kinetic_energy(bullet.muzzle_velocity)
    );
    println!();
    println!("{:<14} {:>12} {:>12} {:>12}", "材質", "0.5cm", "2.0cm", "10.0cm");

    for material in calculator.registry().iter() {
        if material.surface_type == SurfaceType::Default {
            continue;
        }
        let cells: Vec<String> = thicknesses
            .iter()
            .map(|&thickness| {
                match calculator.penetrate(&hit, &bullet, velocity, thickness, material, PenetrationParams::default()) {
                    Ok(result) if result.is_zero => "停止".to_string(),
                    Ok(result) => format!("{:.1}m/s", result.exit_velocity.magnitude()),
                    Err(e) => format!("{}", e),
                }
            })
            .collect();
        println!("{:<14} {:>12} {:>12} {:>12}", material.name, cells[0], cells[1], cells[2]);
    }

    if let Some(contact) = analyze_contact(bullet.as_ref(), bullet.muzzle_velocity, &presets::steel()) {
        println!();
        println!("鋼板への接触解析:");
        println!("  接触半径: {:.3}mm", contact.contact_radius * 1000.0);
        println!("  最大接触圧: {:.1}MPa", contact.peak_pressure / 1.0e6);
        println!("  相当応力: {:.1}MPa", contact.equivalent_stress / 1.0e6);
        println!("  降伏: {}", if contact.yielded { "あり" } else { "なし" });
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    output: Option<&str>,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    scenario.print_summary();
    println!();

    if info_only {
        return Ok(());
    }

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;
    let report = simulation.run()?;

    report.print_summary();

    if let Some(path) = output {
        report.save(path)?;
        println!();
        println!("レポートを保存しました: {}", path);
    }

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  tbsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -o, --output <REPORT>    結果レポートをYAMLで保存");
    println!("  -t, --test               既定材質へのデモ射撃");
    println!("  -v, --verbose            詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL>  ログレベル");
    println!("      --log-output <OUT>   ログ出力先 (console, file, both)");
    println!("  -h, --help               このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/rifle_walls.yaml    - 小銃弾による多層壁の貫通");
    println!("  scenarios/legacy_surfaces.yaml - 被弾面種別（レガシー経路）による計算");
    println!();
    println!("例:");
    println!("  tbsim -s scenarios/rifle_walls.yaml");
    println!("  tbsim -s scenarios/rifle_walls.yaml -vv -o report.yaml");
    println!("  tbsim -s scenarios/legacy_surfaces.yaml -i");
    println!("  tbsim --test");
}
