mod dirs;
mod error;
mod logger;
mod webview;
