//! Fixed registry of supported metadata types.

/// Suffix appended to an entity path to locate its descriptor file.
pub const SIDECAR_SUFFIX: &str = "-meta.xml";

/// Types that carry executable code and therefore trigger test runs.
pub const CODE_TYPES: [&str; 2] = ["ApexClass", "ApexTrigger"];

/// How member names are derived from paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `<folder>/<Name>.<ext>`, member is `Name`
    Flat,
    /// `<folder>/<SubFolder>/<Name>.<ext>`, member is `SubFolder/Name`
    Foldered,
}

/// Static description of a metadata type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataType {
    /// Directory directly under the source root
    pub folder: &'static str,
    /// File extension without the dot; `None` accepts any extension
    pub extension: Option<&'static str>,
    /// Type name used in manifests
    pub name: &'static str,
    pub has_sidecar: bool,
    pub destructible: bool,
    pub layout: Layout,
}

const fn flat(
    folder: &'static str,
    extension: &'static str,
    name: &'static str,
    has_sidecar: bool,
    destructible: bool,
) -> MetadataType {
    MetadataType {
        folder,
        extension: Some(extension),
        name,
        has_sidecar,
        destructible,
        layout: Layout::Flat,
    }
}

const fn foldered(
    folder: &'static str,
    extension: Option<&'static str>,
    name: &'static str,
    has_sidecar: bool,
) -> MetadataType {
    MetadataType {
        folder,
        extension,
        name,
        has_sidecar,
        destructible: true,
        layout: Layout::Foldered,
    }
}

// Reference and settings types are never destroyed: removing them from the
// org breaks the metadata that points at them.
static TYPES: &[MetadataType] = &[
    flat("classes", "cls", "ApexClass", true, true),
    flat("triggers", "trigger", "ApexTrigger", true, true),
    flat("pages", "page", "ApexPage", true, true),
    flat("components", "component", "ApexComponent", true, true),
    flat("staticresources", "resource", "StaticResource", true, true),
    flat("objects", "object", "CustomObject", false, true),
    flat("layouts", "layout", "Layout", false, true),
    flat("tabs", "tab", "CustomTab", false, true),
    flat("flexipages", "flexipage", "FlexiPage", false, true),
    flat("flows", "flow", "Flow", false, true),
    flat("applications", "app", "CustomApplication", false, true),
    flat("permissionsets", "permissionset", "PermissionSet", false, true),
    flat("approvalProcesses", "approvalProcess", "ApprovalProcess", false, true),
    flat("remoteSiteSettings", "remoteSite", "RemoteSiteSetting", false, true),
    flat("profiles", "profile", "Profile", false, false),
    flat("labels", "labels", "CustomLabels", false, false),
    flat("workflows", "workflow", "Workflow", false, false),
    flat("sharingRules", "sharingRules", "SharingRules", false, false),
    flat("settings", "settings", "Settings", false, false),
    flat("translations", "translation", "Translations", false, false),
    foldered("email", Some("email"), "EmailTemplate", true),
    foldered("reports", Some("report"), "Report", false),
    foldered("dashboards", Some("dashboard"), "Dashboard", false),
    foldered("documents", None, "Document", true),
];

/// Find the type registered for a top-level source folder.
pub fn lookup_folder(folder: &str) -> Option<&'static MetadataType> {
    TYPES.iter().find(|t| t.folder == folder)
}

/// Every registered type, in registry order.
pub fn all_types() -> &'static [MetadataType] {
    TYPES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn folders_are_unique() {
        let folders: HashSet<_> = all_types().iter().map(|t| t.folder).collect();
        assert_eq!(folders.len(), all_types().len());
    }

    #[test]
    fn code_types_are_registered_and_destructible() {
        for name in CODE_TYPES {
            let ty = all_types().iter().find(|t| t.name == name).unwrap();
            assert!(ty.destructible);
            assert!(ty.has_sidecar);
        }
    }

    #[test]
    fn settings_like_types_are_not_destructible() {
        for folder in ["profiles", "labels", "settings", "workflows"] {
            assert!(!lookup_folder(folder).unwrap().destructible, "{folder}");
        }
    }

    #[test]
    fn unknown_folder_is_not_registered() {
        assert!(lookup_folder("scripts").is_none());
    }
}
