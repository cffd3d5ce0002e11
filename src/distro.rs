//! Distribution registry: which distribution x architecture x image type
//! combinations the service can build, and the static data each combination
//! carries (output filename, pipeline names, base package set, default
//! ostree ref).

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DistroRegistry {
    distros: Vec<Distro>,
}

impl DistroRegistry {
    pub fn new(distros: Vec<Distro>) -> Self {
        Self { distros }
    }

    /// Registry with the distributions this service ships support for.
    pub fn with_defaults() -> Self {
        let distros = vec![
            Distro::new("rhel-8", "platform:el8", "8", "rhel/8"),
            Distro::new("rhel-84", "platform:el8", "8.4", "rhel/8"),
            Distro::new("rhel-85", "platform:el8", "8.5", "rhel/8"),
            Distro::new("centos-8", "platform:el8", "8", "centos/8"),
            Distro::new("fedora-34", "platform:f34", "34", "fedora/34"),
            Distro::new("fedora-35", "platform:f35", "35", "fedora/35"),
        ];
        Self::new(distros)
    }

    pub fn get(&self, name: &str) -> Option<&Distro> {
        self.distros.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Distro {
    pub name: String,
    pub module_platform_id: String,
    pub releasever: String,
    arches: Vec<Arch>,
}

impl Distro {
    fn new(name: &str, module_platform_id: &str, releasever: &str, ostree_prefix: &str) -> Self {
        let arches = ["x86_64", "aarch64"]
            .into_iter()
            .map(|arch| Arch {
                name: arch.to_string(),
                image_types: image_types_for(ostree_prefix, arch),
            })
            .collect();
        Self {
            name: name.to_string(),
            module_platform_id: module_platform_id.to_string(),
            releasever: releasever.to_string(),
            arches,
        }
    }

    pub fn arch(&self, name: &str) -> Option<&Arch> {
        self.arches.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Arch {
    pub name: String,
    image_types: Vec<ImageTypeDef>,
}

impl Arch {
    pub fn image_type(&self, name: &str) -> Option<&ImageTypeDef> {
        self.image_types.iter().find(|it| it.name == name)
    }
}

/// Static definition of one buildable image type on one architecture.
#[derive(Debug, Clone)]
pub struct ImageTypeDef {
    pub name: String,
    pub filename: String,
    pub default_size: u64,
    pub exports: Vec<String>,
    pub build_pipelines: Vec<String>,
    pub payload_pipelines: Vec<String>,
    /// Names of the package sets payload repositories apply to.
    pub payload_package_sets: Vec<String>,
    base_packages: Vec<String>,
    pub default_ostree_ref: Option<String>,
}

impl ImageTypeDef {
    /// The package sets to depsolve: the build root tools plus the OS
    /// payload, with any extra packages folded into the payload set.
    pub fn package_sets(&self, extra_packages: &[String]) -> HashMap<String, Vec<String>> {
        let mut payload = self.base_packages.clone();
        payload.extend(extra_packages.iter().cloned());
        HashMap::from([
            ("build".to_string(), build_packages()),
            ("packages".to_string(), payload),
        ])
    }
}

const GIB: u64 = 1024 * 1024 * 1024;

fn build_packages() -> Vec<String> {
    ["dnf", "dosfstools", "e2fsprogs", "policycoreutils", "qemu-img", "systemd", "tar", "xz"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn base_packages() -> Vec<String> {
    [
        "kernel",
        "selinux-policy-targeted",
        "chrony",
        "dracut-config-generic",
        "net-tools",
        "NetworkManager",
        "rsync",
        "tar",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn image_types_for(ostree_prefix: &str, arch: &str) -> Vec<ImageTypeDef> {
    let disk = |name: &str, filename: &str, size: u64| ImageTypeDef {
        name: name.to_string(),
        filename: filename.to_string(),
        default_size: size,
        exports: vec!["image".to_string()],
        build_pipelines: vec!["build".to_string()],
        payload_pipelines: vec!["os".to_string(), "image".to_string()],
        payload_package_sets: vec!["packages".to_string()],
        base_packages: base_packages(),
        default_ostree_ref: None,
    };
    let edge = |name: &str, filename: &str, export: &str, payload: &[&str]| ImageTypeDef {
        name: name.to_string(),
        filename: filename.to_string(),
        default_size: GIB,
        exports: vec![export.to_string()],
        build_pipelines: vec!["build".to_string()],
        payload_pipelines: payload.iter().map(|p| p.to_string()).collect(),
        payload_package_sets: vec!["packages".to_string()],
        base_packages: base_packages(),
        default_ostree_ref: Some(format!("{ostree_prefix}/{arch}/edge")),
    };

    vec![
        disk("ami", "image.raw", 6 * GIB),
        disk("ec2", "image.raw.xz", 6 * GIB),
        disk("ec2-ha", "image.raw.xz", 6 * GIB),
        disk("ec2-sap", "image.raw.xz", 6 * GIB),
        disk("gce", "image.tar.gz", 2 * GIB),
        disk("vhd", "disk.vhd", 2 * GIB),
        disk("qcow2", "disk.qcow2", 2 * GIB),
        disk("vmdk", "disk.vmdk", 2 * GIB),
        ImageTypeDef {
            name: "image-installer".to_string(),
            filename: "installer.iso".to_string(),
            default_size: 4 * GIB,
            exports: vec!["bootiso".to_string()],
            build_pipelines: vec!["build".to_string()],
            payload_pipelines: vec!["anaconda-tree".to_string(), "bootiso".to_string()],
            payload_package_sets: vec!["packages".to_string()],
            base_packages: base_packages(),
            default_ostree_ref: None,
        },
        edge("edge-commit", "commit.tar", "commit", &["os", "ostree-commit"]),
        edge(
            "edge-container",
            "container.tar",
            "container",
            &["os", "ostree-commit", "container"],
        ),
        edge(
            "edge-installer",
            "installer.iso",
            "bootiso",
            &["anaconda-tree", "bootiso"],
        ),
    ]
}

/// Validate an ostree ref: slash-separated components of word characters,
/// dots and dashes, each starting with a word character.
pub fn verify_ostree_ref(reference: &str) -> bool {
    if reference.is_empty() {
        return false;
    }
    reference.split('/').all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    })
}
