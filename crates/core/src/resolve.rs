//! 실행 설정 해석: 필터링, 템플릿/리전/버킷/파라미터 해석
//!
//! [`RunConfig`]는 실행 하나의 불변 프로젝트 정보(uid, 프로젝트 루트)와
//! 설정을 묶습니다. 필터링만 유일하게 허용되는 변경이며,
//! 프로비저닝이 시작되기 전에 끝나야 합니다.
//!
//! # 해석 순서
//! ```text
//! filter() → templates() → [BucketStore::resolve] → regions() →
//! rendered_parameters() → test_definitions()
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::client::ClientCache;
use crate::config::{ProjectConfig, StackrunConfig, TestConfig};
use crate::filter::{self, Selection};
use crate::types::{Bucket, BucketRegistry, RegionTarget, Template, TestDefinition};

/// 자동 생성 이름의 공통 prefix
pub const NAME_PREFIX: &str = "stackrun";

/// 의사 파라미터: 프로젝트 이름
pub const PSEUDO_PROJECT_NAME: &str = "$[stackrun_project_name]";
/// 의사 파라미터: 테스트 이름
pub const PSEUDO_TEST_NAME: &str = "$[stackrun_test_name]";
/// 의사 파라미터: 현재 리전
pub const PSEUDO_CURRENT_REGION: &str = "$[stackrun_current_region]";
/// 의사 파라미터: 스테이징 버킷 이름
pub const PSEUDO_BUCKET_NAME: &str = "$[stackrun_bucket_name]";

/// 테스트 이름 → 리전 목록
pub type RegionMap = BTreeMap<String, Vec<RegionTarget>>;

/// 테스트 이름 → 리전 → 렌더링된 파라미터
pub type ParameterMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

/// 실행 설정
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    uid: Uuid,
    project_root: PathBuf,
    config: StackrunConfig,
}

impl RunConfig {
    /// 새 uid로 실행 설정을 만듭니다.
    pub fn new(config: StackrunConfig, project_root: impl Into<PathBuf>) -> Self {
        Self::with_uid(config, project_root, Uuid::new_v4())
    }

    /// uid를 지정하여 실행 설정을 만듭니다.
    ///
    /// 리전을 지정하지 않은 테스트는 이 시점에 프로젝트 리전 목록을 물려받습니다.
    /// 이후 리전 필터로 목록이 비면 그 테스트는 스택을 만들지 않습니다.
    pub fn with_uid(
        mut config: StackrunConfig,
        project_root: impl Into<PathBuf>,
        uid: Uuid,
    ) -> Self {
        let project_regions = config.project.regions.clone();
        for test in config.tests.iter_mut().filter(|t| t.regions.is_empty()) {
            test.regions = project_regions.clone();
        }
        Self {
            uid,
            project_root: project_root.into(),
            config,
        }
    }

    /// 실행 고유 ID
    pub fn uid(&self) -> Uuid {
        self.uid
    }

    /// 자동 생성 이름에 쓰는 짧은 uid (8자)
    pub fn short_uid(&self) -> String {
        self.uid.simple().to_string()[..8].to_owned()
    }

    /// 프로젝트 루트
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// 전체 설정
    pub fn config(&self) -> &StackrunConfig {
        &self.config
    }

    /// 프로젝트 설정
    pub fn project(&self) -> &ProjectConfig {
        &self.config.project
    }

    /// 프로젝트 이름
    pub fn project_name(&self) -> &str {
        &self.config.project.name
    }

    /// 테스트 목록 (필터 적용 후)
    pub fn tests(&self) -> &[TestConfig] {
        &self.config.tests
    }

    /// 리전 축, 테스트 축 순서로 필터를 적용합니다.
    ///
    /// 테스트 자체 리전 목록과 테스트가 물려받는 프로젝트 리전 목록 모두에 적용됩니다.
    pub fn filter(&mut self, test_names: &Selection, regions: &Selection) {
        let trimmed = filter::trim_regions(regions, &self.config.tests);
        self.config.tests = filter::trim_tests(test_names, &trimmed);
        if !regions.is_all() {
            self.config.project.regions = regions.retain_names(&self.config.project.regions);
        }
        debug!(
            tests = self.config.tests.len(),
            test_names = %test_names,
            regions = %regions,
            "applied name filters"
        );
    }

    /// 테스트별 템플릿을 프로젝트 루트 기준으로 해석합니다.
    pub fn templates(&self) -> Vec<Template> {
        self.config
            .tests
            .iter()
            .map(|test| Template {
                test: test.name.clone(),
                path: self.project_root.join(self.config.template_for(test)),
            })
            .collect()
    }

    /// 테스트별 리전과 인증 프로파일을 해석합니다.
    ///
    /// 각 (프로파일, 리전) 세션은 캐시에 미리 만들어 둡니다.
    pub fn regions(&self, clients: &ClientCache) -> RegionMap {
        self.config
            .tests
            .iter()
            .map(|test| {
                let targets = test
                    .regions
                    .iter()
                    .map(|region| {
                        let profile = self.config.project.auth.profile_for(region);
                        let session = clients.session(profile, region);
                        RegionTarget {
                            name: session.region.clone(),
                            profile: session.profile.clone(),
                        }
                    })
                    .collect();
                (test.name.clone(), targets)
            })
            .collect()
    }

    /// 자동 생성 버킷의 기본 이름
    pub fn generated_bucket_name(&self) -> String {
        format!("{NAME_PREFIX}-{}-{}", self.project_name(), self.short_uid())
    }

    /// 설정에 따른 기본 버킷 배치를 계산합니다.
    ///
    /// - `s3_bucket`이 있으면 그 버킷을, 없으면 자동 생성 이름을 공유합니다.
    /// - `s3_regional_buckets`이면 리전마다 `<base>-<region>` 별칭을 둡니다.
    pub fn bucket_layout(&self) -> BucketRegistry {
        let base = if self.config.has_s3_bucket() {
            self.config.project.s3_bucket.clone()
        } else {
            self.generated_bucket_name()
        };
        let home_region = self
            .config
            .tests
            .iter()
            .flat_map(|test| test.regions.iter())
            .next()
            .cloned()
            .unwrap_or_default();

        let mut registry = BucketRegistry::new();
        for test in &self.config.tests {
            for region in &test.regions {
                let bucket = if self.config.project.s3_regional_buckets {
                    Bucket {
                        name: format!("{base}-{region}"),
                        region: region.clone(),
                        regional_buckets: true,
                    }
                } else {
                    Bucket {
                        name: base.clone(),
                        region: home_region.clone(),
                        regional_buckets: false,
                    }
                };
                registry.insert(test.name.clone(), region.clone(), bucket);
            }
        }
        registry
    }

    /// 버킷 레지스트리에서 필터링된 테스트만 남깁니다.
    pub fn scope_buckets(&self, buckets: &BucketRegistry) -> BucketRegistry {
        let keep: HashSet<&str> = self.config.tests.iter().map(|t| t.name.as_str()).collect();
        buckets.retain_tests(&keep)
    }

    /// 테스트/리전별 파라미터를 렌더링합니다.
    ///
    /// 프로젝트 파라미터 위에 테스트 파라미터를 덮어쓰고,
    /// 문자열 값의 의사 파라미터를 치환합니다.
    pub fn rendered_parameters(
        &self,
        buckets: &BucketRegistry,
        regions: &RegionMap,
        templates: &[Template],
    ) -> ParameterMap {
        let mut rendered = ParameterMap::new();
        for test in &self.config.tests {
            // 템플릿이 해석되지 않은 테스트는 건너뜀
            if !templates.iter().any(|t| t.test == test.name) {
                continue;
            }
            let mut merged = self.config.project.parameters.clone();
            merged.extend(test.parameters.clone());

            let per_region = rendered.entry(test.name.clone()).or_default();
            for region in regions.get(&test.name).into_iter().flatten() {
                let bucket = buckets
                    .get(&test.name, &region.name)
                    .map(|b| b.name.as_str())
                    .unwrap_or_default();
                let params = merged
                    .iter()
                    .map(|(key, value)| {
                        let raw = value.as_raw();
                        let value = raw
                            .replace(PSEUDO_PROJECT_NAME, self.project_name())
                            .replace(PSEUDO_TEST_NAME, &test.name)
                            .replace(PSEUDO_CURRENT_REGION, &region.name)
                            .replace(PSEUDO_BUCKET_NAME, bucket);
                        (key.clone(), value)
                    })
                    .collect();
                per_region.insert(region.name.clone(), params);
            }
        }
        rendered
    }

    /// 최종 테스트 정의 목록을 만듭니다 (테스트 선언 순서 유지).
    pub fn test_definitions(
        &self,
        templates: &[Template],
        regions: &RegionMap,
        buckets: &BucketRegistry,
        parameters: &ParameterMap,
    ) -> Vec<TestDefinition> {
        self.config
            .tests
            .iter()
            .filter_map(|test| {
                let template = templates.iter().find(|t| t.test == test.name)?.clone();
                let targets = regions.get(&test.name).cloned().unwrap_or_default();
                let test_buckets = targets
                    .iter()
                    .filter_map(|region| {
                        buckets
                            .get(&test.name, &region.name)
                            .map(|b| (region.name.clone(), b.name.clone()))
                    })
                    .collect();
                Some(TestDefinition {
                    name: test.name.clone(),
                    regions: targets,
                    parameters: parameters.get(&test.name).cloned().unwrap_or_default(),
                    template,
                    buckets: test_buckets,
                })
            })
            .collect()
    }
}

/// 스택 이름을 만듭니다.
///
/// 기본 형식은 `stackrun-<project>-<test>-<suffix>`,
/// 짧은 형식은 `sr-<test>-<suffix>`입니다.
pub fn stack_name(project_name: &str, test: &str, suffix: &str, shorten: bool) -> String {
    if shorten {
        format!("sr-{test}-{suffix}")
    } else {
        format!("{NAME_PREFIX}-{project_name}-{test}-{suffix}")
    }
}
