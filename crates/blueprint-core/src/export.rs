//! Writing a normalized [`WizardState`] back out as a blueprint.
//!
//! Both writers leave out empty sections, so a state exported and imported
//! again comes back unchanged and without diagnostics.

use crate::ExportError;
use blueprint_schema::{
    FileEntry, Firewall, Installer, Kernel, Locale, OpenScapProfile, Services, Timezone,
    UploadTarget, WizardState,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Image-request JSON, stamped with `exported_at`.
pub fn to_image_request(
    state: &WizardState,
    exported_at: DateTime<Utc>,
) -> Result<Value, ExportError> {
    let c = &state.customizations;
    let packages: Vec<String> = c
        .packages
        .iter()
        .cloned()
        .chain(c.groups.iter().map(|g| format!("@{g}")))
        .collect();

    let blueprint = ImageRequestBlueprint {
        name: &state.name,
        description: text(&state.description),
        distribution: &state.distribution,
        metadata: Metadata {
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
        image_requests: state
            .image_targets
            .iter()
            .map(|t| ImageRequest {
                architecture: &t.architecture,
                image_type: &t.image_type,
                upload_request: t.upload.as_ref(),
            })
            .collect(),
        customizations: RequestCustomizations {
            packages: (!packages.is_empty()).then_some(packages),
            users: list(&c.users, |u| RequestUser {
                name: &u.name,
                password: u.password.as_deref(),
                ssh_key: u.ssh_key.as_deref(),
                groups: items(&u.groups),
            }),
            services: services(&c.services),
            firewall: firewall(&c.firewall),
            kernel: kernel(&c.kernel, Append::List),
            locale: locale(&c.locale),
            timezone: timezone(&c.timezone),
            hostname: text(&c.hostname),
            fips: c.fips.then_some(Fips { enabled: true }),
            filesystem: list(&c.filesystem, |p| RequestPartition {
                mountpoint: &p.mountpoint,
                min_size: p.size_label(),
            }),
            files: list(&c.files, file),
            installer: installer(&c.installer),
            openscap: c.openscap.as_ref().map(openscap),
        },
    };
    Ok(serde_json::to_value(blueprint)?)
}

/// System-configuration TOML.
pub fn to_system_config(state: &WizardState) -> Result<String, ExportError> {
    let c = &state.customizations;
    let blueprint = ConfigBlueprint {
        name: &state.name,
        description: text(&state.description),
        distro: &state.distribution,
        packages: list(&c.packages, |name| NamedEntry { name }),
        groups: list(&c.groups, |name| NamedEntry { name }),
        customizations: ConfigCustomizations {
            hostname: text(&c.hostname),
            fips: c.fips.then_some(true),
            kernel: kernel(&c.kernel, |append| Append::Line(append.join(" "))),
            locale: locale(&c.locale),
            timezone: timezone(&c.timezone),
            services: services(&c.services),
            firewall: firewall(&c.firewall),
            installer: installer(&c.installer),
            openscap: c.openscap.as_ref().map(openscap),
            user: list(&c.users, |u| ConfigUser {
                name: &u.name,
                password: u.password.as_deref(),
                key: u.ssh_key.as_deref(),
                groups: items(&u.groups),
            }),
            filesystem: list(&c.filesystem, |p| ConfigPartition {
                mountpoint: &p.mountpoint,
                minsize: p.size_label(),
            }),
            files: list(&c.files, file),
        },
    };
    Ok(toml::to_string_pretty(&blueprint)?)
}

fn text(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn items<T>(v: &[T]) -> Option<&[T]> {
    (!v.is_empty()).then_some(v)
}

fn list<'a, T, U>(v: &'a [T], f: impl FnMut(&'a T) -> U) -> Option<Vec<U>> {
    (!v.is_empty()).then(|| v.iter().map(f).collect())
}

fn services(s: &Services) -> Option<ServicesOut<'_>> {
    let out = ServicesOut {
        enabled: items(&s.enabled),
        disabled: items(&s.disabled),
        masked: items(&s.masked),
    };
    (out.enabled.is_some() || out.disabled.is_some() || out.masked.is_some()).then_some(out)
}

fn firewall(f: &Firewall) -> Option<FirewallOut<'_>> {
    let services = FirewallServicesOut {
        enabled: items(&f.services.enabled),
        disabled: items(&f.services.disabled),
    };
    let services = (services.enabled.is_some() || services.disabled.is_some()).then_some(services);
    let ports = items(&f.ports);
    (ports.is_some() || services.is_some()).then_some(FirewallOut { ports, services })
}

fn kernel<'a>(k: &'a Kernel, append: impl FnOnce(&'a [String]) -> Append<'a>) -> Option<KernelOut<'a>> {
    let name = text(&k.name);
    let append = items(&k.append).map(append);
    (name.is_some() || append.is_some()).then_some(KernelOut { name, append })
}

fn locale(l: &Locale) -> Option<LocaleOut<'_>> {
    let out = LocaleOut {
        languages: items(&l.languages),
        keyboard: text(&l.keyboard),
    };
    (out.languages.is_some() || out.keyboard.is_some()).then_some(out)
}

fn timezone(t: &Timezone) -> Option<TimezoneOut<'_>> {
    let out = TimezoneOut {
        timezone: text(&t.timezone),
        ntpservers: items(&t.ntpservers),
    };
    (out.timezone.is_some() || out.ntpservers.is_some()).then_some(out)
}

fn installer(i: &Installer) -> Option<InstallerOut<'_>> {
    let out = InstallerOut {
        unattended: i.unattended.then_some(true),
        sudo_nopasswd: items(&i.sudo_nopasswd),
    };
    (out.unattended.is_some() || out.sudo_nopasswd.is_some()).then_some(out)
}

fn openscap(p: &OpenScapProfile) -> OpenScapOut<'_> {
    OpenScapOut {
        profile_id: &p.profile_id,
        profile_name: p.profile_name.as_deref(),
        profile_description: p.profile_description.as_deref(),
    }
}

fn file(f: &FileEntry) -> FileOut<'_> {
    FileOut {
        path: &f.path,
        data: f.data.as_deref(),
        mode: f.mode.as_deref(),
        user: f.user.as_deref(),
        group: f.group.as_deref(),
        ensure_parents: f.ensure_parents.then_some(true),
    }
}

#[derive(Serialize)]
struct ImageRequestBlueprint<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    distribution: &'a str,
    metadata: Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image_requests: Vec<ImageRequest<'a>>,
    customizations: RequestCustomizations<'a>,
}

#[derive(Serialize)]
struct Metadata {
    exported_at: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    architecture: &'a str,
    image_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_request: Option<&'a UploadTarget>,
}

#[derive(Serialize)]
struct RequestCustomizations<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    packages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Vec<RequestUser<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<ServicesOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    firewall: Option<FirewallOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kernel: Option<KernelOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<LocaleOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<TimezoneOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fips: Option<Fips>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filesystem: Option<Vec<RequestPartition<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<FileOut<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installer: Option<InstallerOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openscap: Option<OpenScapOut<'a>>,
}

#[derive(Serialize)]
struct RequestUser<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a [String]>,
}

#[derive(Serialize)]
struct RequestPartition<'a> {
    mountpoint: &'a str,
    min_size: String,
}

#[derive(Serialize)]
struct Fips {
    enabled: bool,
}

// TOML needs plain values ahead of tables, so field order matters here.
#[derive(Serialize)]
struct ConfigBlueprint<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    distro: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    packages: Option<Vec<NamedEntry<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<NamedEntry<'a>>>,
    customizations: ConfigCustomizations<'a>,
}

#[derive(Serialize)]
struct NamedEntry<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct ConfigCustomizations<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fips: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kernel: Option<KernelOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<LocaleOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<TimezoneOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<ServicesOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    firewall: Option<FirewallOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installer: Option<InstallerOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openscap: Option<OpenScapOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Vec<ConfigUser<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filesystem: Option<Vec<ConfigPartition<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<FileOut<'a>>>,
}

#[derive(Serialize)]
struct ConfigUser<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a [String]>,
}

#[derive(Serialize)]
struct ConfigPartition<'a> {
    mountpoint: &'a str,
    minsize: String,
}

#[derive(Serialize)]
struct ServicesOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disabled: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    masked: Option<&'a [String]>,
}

#[derive(Serialize)]
struct FirewallOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ports: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<FirewallServicesOut<'a>>,
}

#[derive(Serialize)]
struct FirewallServicesOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disabled: Option<&'a [String]>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Append<'a> {
    List(&'a [String]),
    Line(String),
}

#[derive(Serialize)]
struct KernelOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    append: Option<Append<'a>>,
}

#[derive(Serialize)]
struct LocaleOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    languages: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyboard: Option<&'a str>,
}

#[derive(Serialize)]
struct TimezoneOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ntpservers: Option<&'a [String]>,
}

#[derive(Serialize)]
struct InstallerOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    unattended: Option<bool>,
    #[serde(rename = "sudo-nopasswd", skip_serializing_if = "Option::is_none")]
    sudo_nopasswd: Option<&'a [String]>,
}

#[derive(Serialize)]
struct OpenScapOut<'a> {
    profile_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_description: Option<&'a str>,
}

#[derive(Serialize)]
struct FileOut<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ensure_parents: Option<bool>,
}
