//! Java/Spring defaults layered under every user configuration.
//!
//! The catalog covers the framework and JDK types most business code calls
//! into without indexing them: MyBatis-Plus services and mappers, the Spring
//! bean factory, and the `java.util` collections. `ServiceImpl<M, T>` is
//! described as a generic pattern so `baseMapper` resolves to the concrete
//! mapper of each service.

use chainscope_core::ConfigFile;
use chainscope_core::config::patterns::{PatternEntry, PatternMember, PatternSlot};
use chainscope_core::registry::{CatalogDocument, InferenceRule, MethodDescriptor};
use indexmap::IndexMap;

pub const MYBATIS_PLUS: &str = "mybatis-plus";
pub const SPRING: &str = "spring";
pub const JAVA_STDLIB: &str = "java-stdlib";

/// Utility classes and logging calls that only add noise to a call tree.
pub const DEFAULT_IGNORE: &[&str] = &[
    "StringUtils.*",
    "MapUtils.*",
    "CollectionUtils.*",
    "NumberUtils.*",
    "DateUtils.*",
    "FileUtils.*",
    "IOUtils.*",
    "BeanUtils.*",
    "System.*",
    "Math.*",
    "Arrays.*",
    "Collections.*",
    "Objects.*",
    "Optional.*",
    "Logger.*",
];

pub fn preset() -> ConfigFile {
    ConfigFile {
        ignore: DEFAULT_IGNORE.iter().map(|r| r.to_string()).collect(),
        patterns: patterns(),
        catalog: catalog(),
        catalog_inheritance: inheritance(),
        inference: inference(),
        ..Default::default()
    }
}

fn m(name: &str, parameters: &[&str], returns: &str) -> MethodDescriptor {
    MethodDescriptor::new(name)
        .with_parameters(parameters)
        .returning(returns)
}

fn patterns() -> Vec<PatternEntry> {
    vec![
        PatternEntry {
            ancestor: "ServiceImpl".into(),
            parameters: vec!["M".into(), "T".into()],
            slots: vec![
                PatternSlot {
                    role: "mapper".into(),
                    suffix: "Mapper".into(),
                    catalog_type: Some("BaseMapper".into()),
                },
                PatternSlot {
                    role: "entity".into(),
                    suffix: String::new(),
                    catalog_type: None,
                },
            ],
            members: vec![PatternMember {
                name: "baseMapper".into(),
                type_expr: "M".into(),
            }],
            strip_suffixes: vec!["ServiceImpl".into(), "Impl".into()],
        },
        PatternEntry {
            ancestor: "BaseMapper".into(),
            parameters: vec!["T".into()],
            slots: vec![PatternSlot {
                role: "entity".into(),
                suffix: String::new(),
                catalog_type: None,
            }],
            members: Vec::new(),
            strip_suffixes: vec!["Mapper".into(), "Dao".into()],
        },
    ]
}

fn catalog() -> CatalogDocument {
    let mut catalog = CatalogDocument::new();

    let mybatis = catalog.entry(MYBATIS_PLUS.into()).or_default();
    mybatis.insert(
        "ServiceImpl".into(),
        vec![
            m("insertOrUpdate", &["entity"], "boolean"),
            m("selectById", &["id"], "T"),
            m("selectList", &["wrapper"], "List<T>"),
            m("insert", &["entity"], "boolean"),
            m("updateById", &["entity"], "boolean"),
            m("deleteById", &["id"], "boolean"),
        ],
    );
    mybatis.insert(
        "IService".into(),
        vec![
            m("save", &["entity"], "boolean"),
            m("saveOrUpdate", &["entity"], "boolean"),
            m("getById", &["id"], "T"),
            m("list", &["wrapper"], "List<T>"),
            m("removeById", &["id"], "boolean"),
        ],
    );
    mybatis.insert(
        "BaseMapper".into(),
        vec![
            m("insert", &["entity"], "int"),
            m("selectById", &["id"], "T"),
            m("selectOne", &["wrapper"], "T"),
            m("selectList", &["wrapper"], "List<T>"),
            m("selectPage", &["page", "wrapper"], "IPage<T>"),
            m("selectCount", &["wrapper"], "Integer"),
            m("updateById", &["entity"], "int"),
            m("deleteById", &["id"], "int"),
        ],
    );

    let spring = catalog.entry(SPRING.into()).or_default();
    spring.insert(
        "org.springframework.context.ApplicationContext".into(),
        vec![m("getBean", &["name"], "Object")],
    );
    spring.insert(
        "org.springframework.beans.factory.config.AutowireCapableBeanFactory".into(),
        vec![m(
            "autowire",
            &["existingBean", "autowireMode", "dependencyCheck"],
            "void",
        )],
    );

    let jdk = catalog.entry(JAVA_STDLIB.into()).or_default();
    jdk.insert(
        "java.util.Map".into(),
        vec![
            m("keySet", &[], "Set<K>"),
            m("values", &[], "Collection<V>"),
            m("entrySet", &[], "Set<Map.Entry<K, V>>"),
            m("get", &["key"], "V"),
            m("put", &["key", "value"], "V"),
            m("remove", &["key"], "V"),
            m("size", &[], "int"),
            m("isEmpty", &[], "boolean"),
            m("containsKey", &["key"], "boolean"),
            m("containsValue", &["value"], "boolean"),
        ],
    );
    jdk.insert(
        "java.util.Collection".into(),
        vec![
            m("add", &["element"], "boolean"),
            m("remove", &["element"], "boolean"),
            m("size", &[], "int"),
            m("isEmpty", &[], "boolean"),
            m("contains", &["element"], "boolean"),
            m("iterator", &[], "Iterator<E>"),
            m("toArray", &[], "Object[]"),
            m("stream", &[], "Stream<E>"),
        ],
    );
    jdk.insert(
        "java.util.List".into(),
        vec![
            m("get", &["index"], "E"),
            m("set", &["index", "element"], "E"),
            m("indexOf", &["element"], "int"),
        ],
    );
    jdk.insert("java.util.Set".into(), Vec::new());
    jdk.insert(
        "java.lang.String".into(),
        vec![
            m("length", &[], "int"),
            m("charAt", &["index"], "char"),
            m("substring", &["beginIndex"], "String"),
            m("indexOf", &["ch"], "int"),
            m("toLowerCase", &[], "String"),
            m("toUpperCase", &[], "String"),
            m("trim", &[], "String"),
            m("replace", &["oldChar", "newChar"], "String"),
            m("split", &["regex"], "String[]"),
            m("equalsIgnoreCase", &["anotherString"], "boolean"),
        ],
    );
    jdk.insert(
        "java.lang.Object".into(),
        vec![
            m("toString", &[], "String"),
            m("equals", &["obj"], "boolean"),
            m("hashCode", &[], "int"),
            m("getClass", &[], "Class<?>"),
        ],
    );
    jdk.insert(
        "java.lang.Class".into(),
        vec![
            m("newInstance", &[], "T"),
            m("getName", &[], "String"),
            m("getSimpleName", &[], "String"),
        ],
    );

    catalog
}

/// Child → parent. Uncataloged subtypes inherit their parent's descriptors.
fn inheritance() -> IndexMap<String, String> {
    [
        ("BaseServiceImpl", "ServiceImpl"),
        ("ServiceImpl", "IService"),
        ("ArrayList", "java.util.List"),
        ("LinkedList", "java.util.List"),
        ("Vector", "java.util.List"),
        ("HashSet", "java.util.Set"),
        ("LinkedHashSet", "java.util.Set"),
        ("TreeSet", "java.util.Set"),
        ("HashMap", "java.util.Map"),
        ("LinkedHashMap", "java.util.Map"),
        ("TreeMap", "java.util.Map"),
        ("ConcurrentHashMap", "java.util.Map"),
        ("java.util.List", "java.util.Collection"),
        ("java.util.Set", "java.util.Collection"),
        ("java.util.Collection", "java.lang.Object"),
        ("java.util.Map", "java.lang.Object"),
        ("java.lang.String", "java.lang.Object"),
        ("java.lang.Class", "java.lang.Object"),
    ]
    .into_iter()
    .map(|(child, parent)| (child.to_string(), parent.to_string()))
    .collect()
}

/// MyBatis-Plus verbs on services and mappers the catalog does not list.
fn inference() -> Vec<InferenceRule> {
    let mybatis = |method_pattern: &str, parameters: &[&str], returns: &str| InferenceRule {
        library: MYBATIS_PLUS.into(),
        type_pattern: "(ServiceImpl|Service|Mapper|Dao)$".into(),
        method_pattern: method_pattern.into(),
        returns: Some(returns.into()),
        parameters: parameters.iter().map(|p| p.to_string()).collect(),
    };
    vec![
        mybatis("^(selectById|selectOne|getById|getOne)$", &["id"], "T"),
        mybatis("^(selectList|list|baseListQuery)$", &["param"], "List<T>"),
        mybatis("^(selectPage|page)$", &["page", "wrapper"], "IPage<T>"),
        mybatis("^(count|selectCount|baseCountQuery)$", &["wrapper"], "int"),
        mybatis(
            "^(insert|insertOrUpdate|save|saveOrUpdate|updateById|deleteById|removeById)$",
            &["entity"],
            "boolean",
        ),
        InferenceRule {
            library: SPRING.into(),
            type_pattern: "(ApplicationContext|BeanFactory)$".into(),
            method_pattern: "^getBean$".into(),
            returns: Some("Object".into()),
            parameters: vec!["name".into()],
        },
    ]
}
