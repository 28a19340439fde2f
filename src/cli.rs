use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "device-twin")]
#[command(about = "Photograph a device and get an accessible, voice-ready control list", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を解析して操作部一覧を出力
    Analyze {
        /// 写真ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// MIMEタイプを指定（省略時は画像から判定）
        #[arg(long)]
        mime: Option<String>,

        /// 解析結果JSONの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 一覧ではなくJSONを標準出力へ
        #[arg(long)]
        json: bool,

        /// ADVANCED / DANGER も展開して表示
        #[arg(short = 'a', long)]
        show_advanced: bool,

        /// キャッシュを使用（再解析をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 写真を解析して対話的に操作部を確認
    Scan {
        /// 写真ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// MIMEタイプを指定（省略時は画像から判定）
        #[arg(long)]
        mime: Option<String>,

        /// キャッシュを使用（再解析をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 保存済みの解析結果を対話的に確認
    Show {
        /// 解析結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// モデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}
