//! Xcode file type identifiers ("UTIs") inferred from file names.

/// Type used for files with an unknown extension.
pub const DEFAULT_FILE_TYPE: &str = "file";

/// Suffix of the directories holding localized resources.
pub const LOCALIZED_DIR_EXT: &str = "lproj";

fn extension(name: &str) -> Option<&str> {
  match name.rfind('.') {
    Some(0) | None => None,
    Some(i)        => Some(&name[i + 1 ..])
  }
}

/// Returns the file type of directories Xcode treats as a single file.
///
/// The contents of these bundles are never expanded into groups.
pub fn bundle_file_type(name: &str) -> Option<&'static str> {
  Some(match extension(name)? {
    "app"            => "wrapper.application",
    "appex"          => "wrapper.app-extension",
    "bundle"         => "wrapper.plug-in",
    "framework"      => "wrapper.framework",
    "scnassets"      => "wrapper.scnassets",
    "xcassets"       => "folder.assetcatalog",
    "xcdatamodeld"   => "wrapper.xcdatamodeld",
    "xcframework"    => "wrapper.xcframework",
    "xcmappingmodel" => "wrapper.xcmappingmodel",
    "xcodeproj"      => "wrapper.pb-project",
    "xcstickers"     => "folder.stickers",
    "xctest"         => "wrapper.cfbundle",
    _                => return None
  })
}

pub fn file_type(name: &str) -> &'static str {
  if let Some(t) = bundle_file_type(name) {
    return t;
  }

  match extension(name).unwrap_or("") {
    "a"                          => "archive.ar",
    "c"                          => "sourcecode.c.c",
    "cc" | "cpp" | "cxx"         => "sourcecode.cpp.cpp",
    "css"                        => "text.css",
    "dylib"                      => "compiled.mach-o.dylib",
    "entitlements"               => "text.plist.entitlements",
    "gif"                        => "image.gif",
    "h" | "pch"                  => "sourcecode.c.h",
    "hh" | "hpp" | "hxx" | "ipp" => "sourcecode.cpp.h",
    "html"                       => "text.html",
    "jpg" | "jpeg"               => "image.jpeg",
    "js"                         => "sourcecode.javascript",
    "json"                       => "text.json",
    "m"                          => "sourcecode.c.objc",
    "md"                         => "net.daringfireball.markdown",
    "metal"                      => "sourcecode.metal",
    "mm"                         => "sourcecode.cpp.objcpp",
    "modulemap"                  => "sourcecode.module",
    "plist"                      => "text.plist.xml",
    "png"                        => "image.png",
    "proto"                      => "text",
    "py"                         => "text.script.python",
    "s" | "S"                    => "sourcecode.asm",
    "sh"                         => "text.script.sh",
    "storyboard"                 => "file.storyboard",
    "strings"                    => "text.plist.strings",
    "stringsdict"                => "text.plist.stringsdict",
    "swift"                      => "sourcecode.swift",
    "tbd"                        => "sourcecode.text-based-dylib-definition",
    "txt"                        => "text",
    "xcconfig"                   => "text.xcconfig",
    "xib"                        => "file.xib",
    "xml"                        => "text.xml",
    "yaml" | "yml"               => "text.yaml",
    "zip"                        => "archive.zip",
    _                            => DEFAULT_FILE_TYPE
  }
}

/// Whether a file of the given type is compiled by a sources build phase.
pub fn is_compilable(file_type: &str) -> bool {
  match file_type {
    "sourcecode.c.c"        |
    "sourcecode.c.objc"     |
    "sourcecode.cpp.cpp"    |
    "sourcecode.cpp.objcpp" |
    "sourcecode.asm"        |
    "sourcecode.metal"      |
    "sourcecode.swift"      => true,
    _                       => false
  }
}

/// Returns the locale of a localized resources directory ("en.lproj" -> "en").
pub fn localized_dir_locale(name: &str) -> Option<&str> {
  match extension(name) {
    Some(LOCALIZED_DIR_EXT) => Some(&name[.. name.len() - LOCALIZED_DIR_EXT.len() - 1]),
    _                       => None
  }
}
