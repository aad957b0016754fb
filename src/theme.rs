use crate::dropbox::{EntryKind, Metadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Folder,
    Paper,
    Archive,
    Image,
    Video,
    Audio,
    Document,
    Code,
    Deleted,
    Default,
}

pub fn categorize(entry: &Metadata) -> FileCategory {
    match entry.kind {
        EntryKind::Folder => return FileCategory::Folder,
        EntryKind::Deleted => return FileCategory::Deleted,
        EntryKind::File => {}
    }

    let ext = match entry.name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return FileCategory::Default,
    };

    match ext.as_str() {
        "paper" => FileCategory::Paper,
        "zip" | "tar" | "gz" | "bz2" | "xz" | "rar" | "7z" | "zst" | "tgz" => FileCategory::Archive,
        "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" | "bmp" | "tiff" | "tif" | "heic"
        | "heif" | "avif" => FileCategory::Image,
        "mp4" | "avi" | "mkv" | "mov" | "wmv" | "webm" | "m4v" => FileCategory::Video,
        "mp3" | "flac" | "wav" | "aac" | "ogg" | "m4a" | "opus" => FileCategory::Audio,
        "pdf" | "doc" | "docx" | "txt" | "md" | "rtf" | "odt" | "xls" | "xlsx" | "ppt" | "pptx"
        | "csv" | "epub" | "gdoc" | "gsheet" => FileCategory::Document,
        "rs" | "py" | "js" | "ts" | "go" | "c" | "cpp" | "h" | "java" | "kt" | "swift" | "rb"
        | "php" | "sh" | "lua" | "toml" | "yaml" | "yml" | "json" | "xml" | "html" | "css"
        | "sql" => FileCategory::Code,
        _ => FileCategory::Default,
    }
}

/// ANSI colored text for CLI output, using eza-style colors.
pub fn cli_colored(text: &str, category: FileCategory) -> String {
    let code = match category {
        FileCategory::Folder => "1;34",   // bold blue
        FileCategory::Paper => "1;36",    // bold cyan
        FileCategory::Archive => "1;31",  // bold red
        FileCategory::Image => "35",      // magenta
        FileCategory::Video => "1;35",    // bold magenta
        FileCategory::Audio => "36",      // cyan
        FileCategory::Document => "1;33", // bold yellow
        FileCategory::Code => "1;32",     // bold green
        FileCategory::Deleted => "2;9",   // dim strikethrough
        FileCategory::Default => "0",
    };
    format!("\x1b[{}m{}\x1b[0m", code, text)
}
