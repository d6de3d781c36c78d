//! Runtime permission gate
//!
//! A source may only start once its required permissions are granted. The
//! gate checks grants synchronously and issues an asynchronous request when
//! something is missing; it never waits for the answer and never restarts
//! capture on its own. The host calls `start()` again after a grant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Request code used for every permission request
pub const PERMISSION_REQUEST_CODE: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Camera,
    ReadExternalStorage,
}

impl Permission {
    /// Platform permission name
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Camera => "android.permission.CAMERA",
            Permission::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "android.permission.CAMERA" => Some(Permission::Camera),
            "android.permission.READ_EXTERNAL_STORAGE" => Some(Permission::ReadExternalStorage),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// The OS permission service
pub trait PermissionResolver: Send + Sync {
    fn check_self_permission(&self, permission: Permission) -> PermissionStatus;

    /// Show the OS request; its answer arrives later through the host
    fn request_permissions(&self, permissions: &[Permission], request_code: i32);

    fn on_request_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grants: &[PermissionStatus],
    );
}

/// Checks and requests a fixed set of permissions
#[derive(Clone)]
pub struct PermissionGate {
    resolver: Arc<dyn PermissionResolver>,
    required: Vec<Permission>,
}

impl PermissionGate {
    pub fn new(resolver: Arc<dyn PermissionResolver>, required: Vec<Permission>) -> Self {
        Self { resolver, required }
    }

    /// Gate for camera-backed sources
    pub fn camera(resolver: Arc<dyn PermissionResolver>) -> Self {
        Self::new(resolver, vec![Permission::Camera])
    }

    /// Gate for file-backed sources
    pub fn storage(resolver: Arc<dyn PermissionResolver>) -> Self {
        Self::new(resolver, vec![Permission::ReadExternalStorage])
    }

    pub fn required(&self) -> &[Permission] {
        &self.required
    }

    /// Required permissions not currently granted
    pub fn missing(&self) -> Vec<Permission> {
        self.required
            .iter()
            .copied()
            .filter(|p| self.resolver.check_self_permission(*p) != PermissionStatus::Granted)
            .collect()
    }

    /// Pure query, no side effects
    pub fn permissions_granted(&self) -> bool {
        self.missing().is_empty()
    }

    /// Request whatever is missing without blocking.
    ///
    /// Returns true when everything was already granted.
    pub fn check_and_request(&self) -> bool {
        let missing = self.missing();
        if missing.is_empty() {
            debug!("All required permissions granted");
            return true;
        }
        info!(permissions = ?missing, "Requesting permissions");
        self.resolver
            .request_permissions(&missing, PERMISSION_REQUEST_CODE);
        false
    }

    /// Forward the host's result callback verbatim
    pub fn on_request_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grants: &[PermissionStatus],
    ) {
        for (name, status) in permissions.iter().zip(grants) {
            debug!(permission = %name, ?status, request_code, "Permission result");
        }
        self.resolver
            .on_request_permissions_result(request_code, permissions, grants);
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("required", &self.required)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeResolver {
        granted: Mutex<HashSet<Permission>>,
        requests: Mutex<Vec<(Vec<Permission>, i32)>>,
        results: Mutex<Vec<(i32, Vec<String>, Vec<PermissionStatus>)>>,
    }

    impl PermissionResolver for FakeResolver {
        fn check_self_permission(&self, permission: Permission) -> PermissionStatus {
            if self.granted.lock().contains(&permission) {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            }
        }

        fn request_permissions(&self, permissions: &[Permission], request_code: i32) {
            self.requests.lock().push((permissions.to_vec(), request_code));
        }

        fn on_request_permissions_result(
            &self,
            request_code: i32,
            permissions: &[String],
            grants: &[PermissionStatus],
        ) {
            self.results
                .lock()
                .push((request_code, permissions.to_vec(), grants.to_vec()));
        }
    }

    #[test]
    fn test_missing_permission_is_requested() {
        let resolver = Arc::new(FakeResolver::default());
        let gate = PermissionGate::camera(resolver.clone());

        assert!(!gate.permissions_granted());
        assert!(!gate.check_and_request());

        let requests = resolver.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], (vec![Permission::Camera], PERMISSION_REQUEST_CODE));
    }

    #[test]
    fn test_granted_permission_issues_no_request() {
        let resolver = Arc::new(FakeResolver::default());
        resolver.granted.lock().insert(Permission::ReadExternalStorage);
        let gate = PermissionGate::storage(resolver.clone());

        assert!(gate.check_and_request());
        assert!(gate.permissions_granted());
        assert!(resolver.requests.lock().is_empty());
    }

    #[test]
    fn test_result_is_forwarded_verbatim() {
        let resolver = Arc::new(FakeResolver::default());
        let gate = PermissionGate::camera(resolver.clone());
        let names = vec![Permission::Camera.as_str().to_string()];

        gate.on_request_permissions_result(7, &names, &[PermissionStatus::Denied]);

        let results = resolver.results.lock();
        assert_eq!(results[0], (7, names.clone(), vec![PermissionStatus::Denied]));
    }

    #[test]
    fn test_permission_names_round_trip() {
        for permission in [Permission::Camera, Permission::ReadExternalStorage] {
            assert_eq!(Permission::from_name(permission.as_str()), Some(permission));
        }
        assert_eq!(Permission::from_name("android.permission.RECORD_AUDIO"), None);
    }
}
