mod navigation;
mod support;
