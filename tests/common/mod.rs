//! srcML fixtures shared by the integration tests.
#![allow(dead_code)]

use once_cell::sync::Lazy;
use srcdata::ParsedUnit;
use srcdata::syntax::srcml::parse_str;

pub const NS: &str = r#"xmlns="http://www.srcML.org/srcML/src" xmlns:cpp="http://www.srcML.org/srcML/cpp""#;

pub fn unit(xml: &str) -> ParsedUnit {
    parse_str(xml, None)
        .expect("valid srcML")
        .into_iter()
        .next()
        .expect("one unit")
}

/// `int x; { double x; g(x); } g(x);` inside `void f()`.
pub fn shadowing() -> ParsedUnit {
    static UNIT: Lazy<ParsedUnit> = Lazy::new(|| {
        unit(&format!(
            r#"<unit {NS} language="C++" filename="shadow.cpp"><function><type><name>void</name></type> <name>f</name><parameter_list>()</parameter_list> <block>{{<block_content>
  <decl_stmt><decl><type><name>int</name></type> <name>x</name> <init>= <expr><literal type="number">1</literal></expr></init></decl>;</decl_stmt>
  <block>{{<block_content>
    <decl_stmt><decl><type><name>double</name></type> <name>x</name> <init>= <expr><literal type="number">2.0</literal></expr></init></decl>;</decl_stmt>
    <expr_stmt><expr><call><name>g</name><argument_list>(<argument><expr><name>x</name></expr></argument>)</argument_list></call></expr>;</expr_stmt>
  </block_content>}}</block>
  <expr_stmt><expr><call><name>g</name><argument_list>(<argument><expr><name>x</name></expr></argument>)</argument_list></call></expr>;</expr_stmt>
</block_content>}}</block></function>
</unit>"#
        ))
    });
    UNIT.clone()
}

/// `class A { public: void f(); };`
pub fn base_header() -> ParsedUnit {
    static UNIT: Lazy<ParsedUnit> = Lazy::new(|| {
        unit(&format!(
            r#"<unit {NS} language="C++" filename="a.h"><class>class <name>A</name> <block>{{<public>public:
<function_decl><type><name>void</name></type> <name>f</name><parameter_list>()</parameter_list>;</function_decl>
</public>}}</block>;</class>
</unit>"#
        ))
    });
    UNIT.clone()
}

/// `class B : public A { public: void g() { f(); } };`
pub fn derived_source() -> ParsedUnit {
    static UNIT: Lazy<ParsedUnit> = Lazy::new(|| {
        unit(&format!(
            r#"<unit {NS} language="C++" filename="b.cpp"><class>class <name>B</name> <super_list>: <super><specifier>public</specifier> <name>A</name></super></super_list> <block>{{<public>public:
<function><type><name>void</name></type> <name>g</name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name>f</name><argument_list>()</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
</public>}}</block>;</class>
</unit>"#
        ))
    });
    UNIT.clone()
}

/// `class A { void f(); };` (optional) and `class B : public A { void g(); };` in x.h.
pub fn hierarchy_header(with_base: bool) -> ParsedUnit {
    let base = if with_base {
        r#"<class>class <name>A</name> <block>{<public>public:
<function_decl><type><name>void</name></type> <name>f</name><parameter_list>()</parameter_list>;</function_decl>
</public>}</block>;</class>
"#
    } else {
        ""
    };
    let supers = if with_base {
        r#" <super_list>: <super><specifier>public</specifier> <name>A</name></super></super_list>"#
    } else {
        ""
    };
    unit(&format!(
        r#"<unit {NS} language="C++" filename="x.h">{base}<class>class <name>B</name>{supers} <block>{{<public>public:
<function_decl><type><name>void</name></type> <name>g</name><parameter_list>()</parameter_list>;</function_decl>
</public>}}</block>;</class>
</unit>"#
    ))
}

/// `void B::g() { f(); }` in y.cpp.
pub fn out_of_line_source() -> ParsedUnit {
    unit(&format!(
        r#"<unit {NS} language="C++" filename="y.cpp"><function><type><name>void</name></type> <name><name>B</name><operator>::</operator><name>g</name></name><parameter_list>()</parameter_list> <block>{{<block_content> <expr_stmt><expr><call><name>f</name><argument_list>()</argument_list></call></expr>;</expr_stmt> </block_content>}}</block></function>
</unit>"#
    ))
}

/// C functions with empty bodies, one per line.
pub fn functions(path: &str, names: &[&str]) -> ParsedUnit {
    let body: String = names
        .iter()
        .map(|n| {
            format!(
                "<function><type><name>void</name></type> <name>{n}</name><parameter_list>()</parameter_list> <block>{{<block_content> </block_content>}}</block></function>\n"
            )
        })
        .collect();
    unit(&format!(
        r#"<unit {NS} language="C" filename="{path}">{body}</unit>"#
    ))
}

/// `package app; class <name> {}`
pub fn java_class(path: &str, name: &str) -> ParsedUnit {
    unit(&format!(
        r#"<unit xmlns="http://www.srcML.org/srcML/src" language="Java" filename="{path}"><package>package <name>app</name>;</package>
<class>class <name>{name}</name> <block>{{}}</block></class>
</unit>"#
    ))
}
