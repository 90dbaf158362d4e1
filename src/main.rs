//! clipdesk 命令行入口（组合根）
//!
//! 读取设置 → 初始化日志 → 按子命令组装组件。所有组件从这里拿到各自的设置段。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use clipdesk::clipboard::{self, ClipboardMonitor, ContentClassifier, ItemList, SuppressionGate};
use clipdesk::download::{DownloadEvent, DownloadWorker, Phase};
use clipdesk::error::AppError;
use clipdesk::logging;
use clipdesk::resources::{
    ClassIndex, DownloadLinks, Resolution, ResourceError, ResourceIndex, ResourceResolver,
};
use clipdesk::settings::AppSettings;
use clipdesk::storage;

#[derive(Debug, Parser)]
#[command(name = "clipdesk", about = "剪贴板捕获与离线文档工具", version)]
struct Cli {
    /// 设置文件（默认 `<base-dir>/settings.json`）
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// 数据根目录，覆盖设置文件中的 `paths.base_dir`
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 监听系统剪贴板并记录捕获的条目
    Watch {
        /// 捕获指定数量的条目后退出
        #[arg(long)]
        max_items: Option<usize>,
    },
    /// 解析文档资源，未命中时下载一次
    Resolve {
        category: String,
        subcategory: String,
        /// 只解析，不触发下载
        #[arg(long)]
        no_download: bool,
    },
    /// 搜索类名索引与资源树
    Search { query: String },
    /// 显示路径布局与目录占用
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings_path = cli.settings.clone().unwrap_or_else(|| {
        cli.base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    });

    let loaded = AppSettings::try_load(&settings_path);
    let mut settings = match &loaded {
        Ok(Some(settings)) => settings.clone(),
        _ => AppSettings::default(),
    };
    if let Some(base_dir) = &cli.base_dir {
        settings = settings.with_base_dir(base_dir);
    }

    let paths = settings.resolved_paths();
    logging::init(&settings.log, &paths.log_file);

    match loaded {
        Ok(Some(_)) => log::info!("⚙️ 已加载设置 {}", settings_path.display()),
        Ok(None) => log::info!("⚙️ 未找到设置文件 {}，使用默认设置", settings_path.display()),
        Err(e) => log::error!("❌ 设置文件无效，使用默认设置: {}", e),
    }

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {}", e);
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, settings: &AppSettings) -> Result<(), AppError> {
    match command {
        Command::Watch { max_items } => watch(settings, max_items),
        Command::Resolve {
            category,
            subcategory,
            no_download,
        } => resolve(settings, &category, &subcategory, no_download),
        Command::Search { query } => search(settings, &query),
        Command::Status => status(settings),
    }
}

fn watch(settings: &AppSettings, max_items: Option<usize>) -> Result<(), AppError> {
    let gate = SuppressionGate::new();
    let classifier = ContentClassifier::new(settings.image.clone())?;
    let monitor = Arc::new(ClipboardMonitor::new(gate, classifier));

    let (sender, receiver) = mpsc::channel();
    let listener = clipboard::start_monitoring(monitor, sender);
    println!("正在监听剪贴板（面板快捷键 {}），Ctrl+C 退出", settings.shortcut);

    let mut items = ItemList::new();
    for item in receiver.iter() {
        println!("[{}] {}", item.captured_at_label(), item.summary());
        items.push(item);
        if max_items.is_some_and(|max| items.len() >= max) {
            break;
        }
    }

    // 接收端关闭后监听线程会在下一次变化时退出
    drop(receiver);
    drop(listener);
    log::info!("📋 本次共捕获 {} 个条目", items.len());
    Ok(())
}

fn resolve(settings: &AppSettings, category: &str, subcategory: &str, no_download: bool) -> Result<(), AppError> {
    let paths = settings.resolved_paths();
    storage::ensure_dir(&paths.download_dir)?;
    storage::ensure_dir(&paths.extract_root)?;

    let index = ResourceIndex::load(&paths.resource_index, paths.extract_root.clone());
    let links = DownloadLinks::load(&paths.download_links);
    let worker = DownloadWorker::new(settings.download.clone(), paths.download_dir.clone(), paths.extractor.clone());
    let resolver = ResourceResolver::new(index, links, worker);

    if no_download {
        return match resolver.resolve(category, subcategory) {
            Resolution::Found(location) => {
                println!("{}", location);
                Ok(())
            }
            Resolution::Missing { download_key } => Err(ResourceError::Unavailable(format!(
                "{}/{}（下载键: {}）",
                category,
                subcategory,
                download_key.as_deref().unwrap_or("无")
            ))
            .into()),
        };
    }

    let location = resolver.resolve_or_download(category, subcategory, |event| {
        if let DownloadEvent::Progress(update) = event {
            let phase = match update.phase {
                Phase::Downloading => "下载",
                Phase::Extracting => "解压",
            };
            match update.total_bytes {
                Some(total) => println!(
                    "{:>3}% {} {}/{} ({}/{} bytes)",
                    update.percent,
                    phase,
                    update.file_index + 1,
                    update.file_count,
                    update.downloaded_bytes,
                    total
                ),
                None => println!("{:>3}% {} ({} bytes)", update.percent, phase, update.downloaded_bytes),
            }
        }
    })?;

    println!("{}", location);
    Ok(())
}

fn search(settings: &AppSettings, query: &str) -> Result<(), AppError> {
    let paths = settings.resolved_paths();
    let classes = ClassIndex::load(&paths.class_index, paths.extract_root.clone());
    let index = ResourceIndex::load(&paths.resource_index, paths.extract_root.clone());

    let class_hits = classes.search(query);
    for entry in &class_hits {
        let location = classes.document_path(&entry.path);
        let marker = if location.exists() { "" } else { " (未下载)" };
        println!("类  {} -> {}{}", entry.class_name, location, marker);
    }

    let resource_hits = index.search(query);
    for hit in &resource_hits {
        println!("资源 {} -> {}", hit.key(), hit.paths.join(", "));
    }

    if class_hits.is_empty() && resource_hits.is_empty() {
        println!("未找到与 {:?} 匹配的结果", query);
    }
    Ok(())
}

fn status(settings: &AppSettings) -> Result<(), AppError> {
    let paths = settings.resolved_paths();
    let index = ResourceIndex::load(&paths.resource_index, paths.extract_root.clone());
    let links = DownloadLinks::load(&paths.download_links);
    let worker = DownloadWorker::new(settings.download.clone(), paths.download_dir.clone(), paths.extractor.clone());

    println!("数据根目录   {}", paths.base_dir.display());
    println!("资源索引     {}（{} 项）", paths.resource_index.display(), index.root().leaf_count());
    println!("下载地址表   {}（{} 项）", paths.download_links.display(), links.len());
    println!("类索引       {}", paths.class_index.display());
    println!(
        "解压工具     {}{}",
        paths.extractor.display(),
        if worker.extractor().is_available() { "" } else { " (缺失)" }
    );
    println!("日志文件     {}", paths.log_file.display());
    println!("快捷键       {}", settings.shortcut);

    for (label, dir) in [("下载目录", &paths.download_dir), ("解压目录", &paths.extract_root)] {
        let info = storage::dir_info(dir);
        if info.exists {
            println!(
                "{}     {}（{} 个文件，{:.2} MB）",
                label,
                info.path,
                info.file_count,
                info.total_size as f64 / 1024.0 / 1024.0
            );
        } else {
            println!("{}     {}（不存在）", label, info.path);
        }
    }
    Ok(())
}
