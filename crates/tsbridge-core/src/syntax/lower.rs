//! Lowers swc's TypeScript AST into the declaration model.

use swc_common::{SourceMap, SourceMapper, Span, Spanned};
use swc_ecma_ast as swc;
use tracing::debug;

use super::error_at;
use crate::ast::{
    Alias, Class, Declaration, Enum, EnumMember, EnumValue, IndexSignature, Interface, Keyword,
    Member, Method, Module, Param, Property, RpcCall, TsType, TypeRef,
};
use crate::errors::ParseError;

type PResult<T> = Result<T, ParseError>;

pub(super) fn module(source_map: &SourceMap, program: &swc::Module) -> PResult<Module> {
    let lower = Lower { source_map };
    let mut declarations = Vec::new();
    for item in &program.body {
        let decl = match item {
            swc::ModuleItem::ModuleDecl(swc::ModuleDecl::ExportDecl(export)) => {
                lower.declaration(&export.decl)?
            }
            swc::ModuleItem::ModuleDecl(swc::ModuleDecl::ExportDefaultDecl(export)) => {
                lower.default_declaration(&export.decl)?
            }
            swc::ModuleItem::Stmt(swc::Stmt::Decl(decl)) => {
                if let Some(name) = declared_name(decl) {
                    debug!(name, "skipping non-exported declaration");
                }
                None
            }
            _ => None,
        };
        if let Some(decl) = decl {
            debug!(name = decl.name(), "parsed declaration");
            declarations.push(decl);
        }
    }
    Ok(Module { declarations })
}

struct Lower<'a> {
    source_map: &'a SourceMap,
}

impl Lower<'_> {
    fn error(&self, span: Span, message: impl Into<String>) -> ParseError {
        error_at(self.source_map, span.lo, message)
    }

    fn declaration(&self, decl: &swc::Decl) -> PResult<Option<Declaration>> {
        Ok(Some(match decl {
            swc::Decl::TsInterface(i) => Declaration::Interface(self.interface(i)?),
            swc::Decl::TsEnum(e) => Declaration::Enum(self.enumeration(e)?),
            swc::Decl::TsTypeAlias(a) => Declaration::Alias(self.alias(a)),
            swc::Decl::Class(c) => Declaration::Class(self.class(&c.ident, &c.class)),
            _ => return Ok(None),
        }))
    }

    fn default_declaration(&self, decl: &swc::DefaultDecl) -> PResult<Option<Declaration>> {
        Ok(match decl {
            swc::DefaultDecl::TsInterfaceDecl(i) => {
                Some(Declaration::Interface(self.interface(i)?))
            }
            swc::DefaultDecl::Class(c) => c
                .ident
                .as_ref()
                .map(|ident| Declaration::Class(self.class(ident, &c.class))),
            _ => None,
        })
    }

    // ── interface ─────────────────────────────────────────────────────────

    fn interface(&self, i: &swc::TsInterfaceDecl) -> PResult<Interface> {
        let extends = i
            .extends
            .iter()
            .map(|base| {
                let name = expr_path(&base.expr)
                    .ok_or_else(|| self.error(base.span, "base types must be named references"))?;
                Ok(TypeRef {
                    name: name.join("."),
                    args: self.type_args(base.type_args.as_deref()),
                })
            })
            .collect::<PResult<Vec<_>>>()?;
        Ok(Interface {
            name: i.id.sym.to_string(),
            generics: generics(i.type_params.as_deref()),
            extends,
            members: self.members(&i.body.body),
        })
    }

    fn members(&self, elements: &[swc::TsTypeElement]) -> Vec<Member> {
        elements.iter().filter_map(|el| self.member(el)).collect()
    }

    fn member(&self, element: &swc::TsTypeElement) -> Option<Member> {
        match element {
            swc::TsTypeElement::TsPropertySignature(p) => {
                let Some(name) = property_key(&p.key, p.computed) else {
                    debug!("skipping computed property key");
                    return None;
                };
                Some(Member::Property(Property {
                    name,
                    optional: p.optional,
                    readonly: p.readonly,
                    ty: self
                        .annotation(p.type_ann.as_deref())
                        .unwrap_or(TsType::Keyword(Keyword::Any)),
                }))
            }
            swc::TsTypeElement::TsIndexSignature(index) => {
                let swc::TsFnParam::Ident(key) = index.params.first()? else {
                    return None;
                };
                Some(Member::Index(IndexSignature {
                    key_name: key.id.sym.to_string(),
                    key_ty: self.annotation(key.type_ann.as_deref())?,
                    value_ty: self
                        .annotation(index.type_ann.as_deref())
                        .unwrap_or(TsType::Keyword(Keyword::Any)),
                }))
            }
            _ => {
                debug!("skipping method or call signature in object type");
                None
            }
        }
    }

    fn annotation(&self, ann: Option<&swc::TsTypeAnn>) -> Option<TsType> {
        ann.map(|a| self.ty(&a.type_ann))
    }

    // ── types ─────────────────────────────────────────────────────────────

    fn ty(&self, ty: &swc::TsType) -> TsType {
        match ty {
            swc::TsType::TsKeywordType(k) => match keyword(k.kind) {
                Some(kw) => TsType::Keyword(kw),
                None => self.unsupported(k.span),
            },
            swc::TsType::TsTypeRef(r) => self.type_ref(r),
            swc::TsType::TsArrayType(a) => TsType::Array(Box::new(self.ty(&a.elem_type))),
            swc::TsType::TsTypeLit(lit) => TsType::Literal(self.members(&lit.members)),
            swc::TsType::TsUnionOrIntersectionType(swc::TsUnionOrIntersectionType::TsUnionType(
                u,
            )) => TsType::Union(u.types.iter().map(|t| self.ty(t)).collect()),
            swc::TsType::TsParenthesizedType(p) => self.ty(&p.type_ann),
            swc::TsType::TsTypeOperator(op)
                if matches!(op.op, swc::TsTypeOperatorOp::ReadOnly) =>
            {
                self.ty(&op.type_ann)
            }
            swc::TsType::TsLitType(lit) => match &lit.lit {
                swc::TsLit::Str(s) => TsType::StringLiteral(s.value.to_string()),
                swc::TsLit::Number(n) => TsType::NumberLiteral(n.value),
                swc::TsLit::Bool(b) => TsType::BooleanLiteral(b.value),
                _ => self.unsupported(lit.span),
            },
            other => self.unsupported(other.span()),
        }
    }

    fn unsupported(&self, span: Span) -> TsType {
        let text = self
            .source_map
            .span_to_snippet(span)
            .unwrap_or_else(|_| "unsupported type".to_string());
        debug!(%text, "type kept as unsupported");
        TsType::Unsupported(text)
    }

    fn type_ref(&self, r: &swc::TsTypeRef) -> TsType {
        let name = entity_name(&r.type_name);
        let mut args = self.type_args(r.type_params.as_deref());
        if matches!(name.as_str(), "Array" | "ReadonlyArray") && args.len() == 1 {
            return TsType::Array(Box::new(args.remove(0)));
        }
        TsType::Reference(TypeRef { name, args })
    }

    fn type_args(&self, args: Option<&swc::TsTypeParamInstantiation>) -> Vec<TsType> {
        args.map(|a| a.params.iter().map(|t| self.ty(t)).collect())
            .unwrap_or_default()
    }

    // ── enum / alias ──────────────────────────────────────────────────────

    fn enumeration(&self, e: &swc::TsEnumDecl) -> PResult<Enum> {
        let mut members = Vec::with_capacity(e.members.len());
        for m in &e.members {
            let name = match &m.id {
                swc::TsEnumMemberId::Ident(id) => id.sym.to_string(),
                swc::TsEnumMemberId::Str(s) => s.value.to_string(),
            };
            let value = m
                .init
                .as_deref()
                .map(|init| self.enum_value(init))
                .transpose()?;
            members.push(EnumMember { name, value });
        }
        let lowered = Enum {
            name: e.id.sym.to_string(),
            members,
        };
        lowered
            .numeric_values()
            .map_err(|err| self.error(e.span, err.to_string()))?;
        Ok(lowered)
    }

    fn enum_value(&self, init: &swc::Expr) -> PResult<EnumValue> {
        match init {
            swc::Expr::Lit(swc::Lit::Str(s)) => Ok(EnumValue::String(s.value.to_string())),
            swc::Expr::Lit(swc::Lit::Num(n)) => self.integer(n, false),
            swc::Expr::Unary(u) if matches!(u.op, swc::UnaryOp::Minus) => match &*u.arg {
                swc::Expr::Lit(swc::Lit::Num(n)) => self.integer(n, true),
                other => Err(self.error(other.span(), "expected a number after '-'")),
            },
            swc::Expr::Paren(p) => self.enum_value(&p.expr),
            other => Err(self.error(
                other.span(),
                "enum initialisers must be string or integer literals",
            )),
        }
    }

    /// Exact value of an integer literal. The raw text is read first so
    /// that hex literals beyond 2^53 keep every digit.
    fn integer(&self, n: &swc::Number, negative: bool) -> PResult<EnumValue> {
        let exact = match n.raw.as_deref().and_then(integer_literal) {
            Some(v) => Some(v),
            None if n.value.fract() == 0.0 && n.value.abs() < 2f64.powi(63) => {
                Some(n.value as i128)
            }
            None => None,
        };
        let Some(magnitude) = exact else {
            return Err(self.error(
                n.span,
                format!("enum value {} is not an integer in i64 range", n.value),
            ));
        };
        let value = if negative { -magnitude } else { magnitude };
        i64::try_from(value)
            .map(EnumValue::Number)
            .map_err(|_| self.error(n.span, format!("enum value {value} does not fit in i64")))
    }

    fn alias(&self, a: &swc::TsTypeAliasDecl) -> Alias {
        Alias {
            name: a.id.sym.to_string(),
            generics: generics(a.type_params.as_deref()),
            ty: self.ty(&a.type_ann),
        }
    }

    // ── class ─────────────────────────────────────────────────────────────

    fn class(&self, ident: &swc::Ident, class: &swc::Class) -> Class {
        let methods = class
            .body
            .iter()
            .filter_map(|member| match member {
                swc::ClassMember::Method(m) => self.method(m),
                _ => None,
            })
            .collect();
        Class {
            name: ident.sym.to_string(),
            methods,
        }
    }

    fn method(&self, m: &swc::ClassMethod) -> Option<Method> {
        if matches!(m.accessibility, Some(swc::Accessibility::Private))
            || !matches!(m.kind, swc::MethodKind::Method)
        {
            return None;
        }
        let name = match &m.key {
            swc::PropName::Ident(id) => id.sym.to_string(),
            swc::PropName::Str(s) => s.value.to_string(),
            _ => return None,
        };
        let function = &m.function;
        Some(Method {
            name,
            params: function.params.iter().map(|p| self.param(&p.pat)).collect(),
            return_type: self.annotation(function.return_type.as_deref()),
            call: function
                .body
                .as_ref()
                .and_then(|body| find_rpc_call(&body.stmts)),
        })
    }

    fn param(&self, pat: &swc::Pat) -> Param {
        match pat {
            swc::Pat::Ident(b) => Param {
                name: b.id.sym.to_string(),
                ty: self.annotation(b.type_ann.as_deref()),
                optional: b.id.optional,
                has_default: false,
            },
            swc::Pat::Assign(a) => Param {
                has_default: true,
                ..self.param(&a.left)
            },
            swc::Pat::Rest(r) => {
                let inner = self.param(&r.arg);
                Param {
                    ty: self.annotation(r.type_ann.as_deref()).or(inner.ty),
                    ..inner
                }
            }
            // Destructured parameters are passed through whole.
            swc::Pat::Object(o) => Param {
                name: "args".into(),
                ty: self.annotation(o.type_ann.as_deref()),
                optional: o.optional,
                has_default: false,
            },
            swc::Pat::Array(a) => Param {
                name: "args".into(),
                ty: self.annotation(a.type_ann.as_deref()),
                optional: a.optional,
                has_default: false,
            },
            _ => Param {
                name: "args".into(),
                ty: None,
                optional: false,
                has_default: false,
            },
        }
    }
}

fn declared_name(decl: &swc::Decl) -> Option<String> {
    Some(match decl {
        swc::Decl::TsInterface(i) => i.id.sym.to_string(),
        swc::Decl::TsEnum(e) => e.id.sym.to_string(),
        swc::Decl::TsTypeAlias(a) => a.id.sym.to_string(),
        swc::Decl::Class(c) => c.ident.sym.to_string(),
        _ => return None,
    })
}

fn generics(params: Option<&swc::TsTypeParamDecl>) -> Vec<String> {
    params
        .map(|p| p.params.iter().map(|t| t.name.sym.to_string()).collect())
        .unwrap_or_default()
}

fn keyword(kind: swc::TsKeywordTypeKind) -> Option<Keyword> {
    use swc::TsKeywordTypeKind as K;
    Some(match kind {
        K::TsStringKeyword => Keyword::String,
        K::TsNumberKeyword => Keyword::Number,
        K::TsBooleanKeyword => Keyword::Boolean,
        K::TsBigIntKeyword => Keyword::BigInt,
        K::TsAnyKeyword => Keyword::Any,
        K::TsUnknownKeyword => Keyword::Unknown,
        K::TsNullKeyword => Keyword::Null,
        K::TsUndefinedKeyword => Keyword::Undefined,
        K::TsVoidKeyword => Keyword::Void,
        K::TsObjectKeyword => Keyword::Object,
        _ => return None,
    })
}

fn entity_name(name: &swc::TsEntityName) -> String {
    match name {
        swc::TsEntityName::Ident(id) => id.sym.to_string(),
        swc::TsEntityName::TsQualifiedName(q) => {
            format!("{}.{}", entity_name(&q.left), q.right.sym)
        }
    }
}

/// Identifier, string or number key. Computed keys other than literals are
/// dropped.
fn property_key(key: &swc::Expr, computed: bool) -> Option<String> {
    match key {
        swc::Expr::Ident(id) if !computed => Some(id.sym.to_string()),
        swc::Expr::Lit(swc::Lit::Str(s)) => Some(s.value.to_string()),
        swc::Expr::Lit(swc::Lit::Num(n)) => Some(n.value.to_string()),
        _ => None,
    }
}

/// Decimal, hex, octal or binary digits with optional `_` separators.
fn integer_literal(raw: &str) -> Option<i128> {
    let digits: String = raw
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let (body, radix) = match digits.get(..2) {
        Some("0x") => (&digits[2..], 16),
        Some("0o") => (&digits[2..], 8),
        Some("0b") => (&digits[2..], 2),
        _ => (digits.as_str(), 10),
    };
    i128::from_str_radix(body, radix).ok()
}

/// `this.client` → `["this", "client"]`; `None` for anything but
/// identifiers joined by `.`.
fn expr_path(expr: &swc::Expr) -> Option<Vec<String>> {
    match expr {
        swc::Expr::Ident(id) => Some(vec![id.sym.to_string()]),
        swc::Expr::This(_) => Some(vec!["this".to_string()]),
        swc::Expr::Member(m) => {
            let swc::MemberProp::Ident(prop) = &m.prop else {
                return None;
            };
            let mut path = expr_path(&m.obj)?;
            path.push(prop.sym.to_string());
            Some(path)
        }
        _ => None,
    }
}

/// First `return [await] <target>.call('rpc', [args...])` in a method body,
/// looking into nested blocks, `if` branches and `try` blocks.
fn find_rpc_call(stmts: &[swc::Stmt]) -> Option<RpcCall> {
    stmts.iter().find_map(|stmt| match stmt {
        swc::Stmt::Return(ret) => ret.arg.as_deref().and_then(rpc_call),
        swc::Stmt::Block(block) => find_rpc_call(&block.stmts),
        swc::Stmt::If(s) => find_rpc_call(std::slice::from_ref(&*s.cons)).or_else(|| {
            s.alt
                .as_deref()
                .and_then(|alt| find_rpc_call(std::slice::from_ref(alt)))
        }),
        swc::Stmt::Try(t) => find_rpc_call(&t.block.stmts),
        _ => None,
    })
}

fn rpc_call(expr: &swc::Expr) -> Option<RpcCall> {
    let expr = match expr {
        swc::Expr::Await(a) => &*a.arg,
        other => other,
    };
    let swc::Expr::Call(call) = expr else {
        return None;
    };
    let swc::Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let swc::Expr::Member(member) = &**callee else {
        return None;
    };
    match &member.prop {
        swc::MemberProp::Ident(prop) if &*prop.sym == "call" => {}
        _ => return None,
    }

    let mut args = call.args.iter();
    let method = match &*args.next()?.expr {
        swc::Expr::Lit(swc::Lit::Str(s)) => s.value.to_string(),
        _ => return None,
    };
    // Only identifier and member-expression arguments are kept.
    let paths = match args.next().map(|a| &*a.expr) {
        Some(swc::Expr::Array(array)) => array
            .elems
            .iter()
            .flatten()
            .filter(|e| e.spread.is_none())
            .filter_map(|e| expr_path(&e.expr))
            .collect(),
        _ => Vec::new(),
    };
    Some(RpcCall {
        method,
        args: paths,
    })
}
